//! 容器构建器
//!
//! 收集配置源、显式 Bean 和注册选项，构建完成注册的容器

use crate::implementor::{ImplementationCache, ImplementationGenerator};
use crate::registerer::{BeanRegisterer, RegistererConfigurator};
use config_abstractions::ConfigProvider;
use config_impl::{
    ConfigLoader, EnvironmentConfigProvider, JsonConfigProvider, TomlConfigProvider,
    YamlConfigProvider,
};
use di_abstractions::{BeanCache, ComponentScanner, ContainerConfig, EventNotifier, MetadataSource};
use di_impl::{
    Container, EventDispatcher, ManifestComponentScanner, ManifestMetadataSource, NullBeanCache,
};
use infrastructure_common::{
    AdHocFactory, BeanEntry, InfrastructureError, InfrastructureResult, TypeMetadata,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 容器构建器
pub struct ContainerBuilder {
    config_sources: Vec<Box<dyn ConfigProvider>>,
    namespaces: Vec<String>,
    stereotypes: Vec<String>,
    beans: Vec<(String, BeanEntry)>,
    components: Vec<Arc<TypeMetadata>>,
    factories: Vec<(String, AdHocFactory)>,
    configurators: Vec<Arc<dyn RegistererConfigurator>>,
    scanner: Option<Arc<dyn ComponentScanner>>,
    metadata_source: Option<Arc<dyn MetadataSource>>,
    cache: Option<Arc<dyn BeanCache>>,
    events: Option<Arc<dyn EventNotifier>>,
    implementation_cache: Option<Arc<ImplementationCache>>,
    fingerprint_ledger: Option<PathBuf>,
    container_config: ContainerConfig,
    logging_enabled: bool,
    logging_config: LoggingConfig,
}

impl ContainerBuilder {
    /// 创建新的容器构建器
    pub fn new() -> Self {
        Self {
            config_sources: Vec::new(),
            namespaces: Vec::new(),
            stereotypes: Vec::new(),
            beans: Vec::new(),
            components: Vec::new(),
            factories: Vec::new(),
            configurators: Vec::new(),
            scanner: None,
            metadata_source: None,
            cache: None,
            events: None,
            implementation_cache: None,
            fingerprint_ledger: None,
            container_config: ContainerConfig::default(),
            logging_enabled: false, // 默认不初始化日志
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加 TOML 配置文件: {}", path.display());
        self.config_sources.push(Box::new(TomlConfigProvider::new(path)?));
        Ok(self)
    }

    /// 添加 YAML 配置文件
    pub fn add_config_yaml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加 YAML 配置文件: {}", path.display());
        self.config_sources.push(Box::new(YamlConfigProvider::new(path)?));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加 JSON 配置文件: {}", path.display());
        self.config_sources.push(Box::new(JsonConfigProvider::new(path)?));
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.config_sources
            .push(Box::new(EnvironmentConfigProvider::new(prefix)));
        self
    }

    /// 添加自定义配置源
    pub fn add_config_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.config_sources.push(Box::new(provider));
        self
    }

    /// 限定扫描的命名空间
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.extend(namespaces.into_iter().map(Into::into));
        self
    }

    /// 追加自定义构造型
    pub fn with_stereotypes<I, S>(mut self, stereotypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stereotypes
            .extend(stereotypes.into_iter().map(Into::into));
        self
    }

    /// 注册显式条目，在配置值之后、扫描之前写入容器
    pub fn with_bean(mut self, id: impl Into<String>, entry: impl Into<BeanEntry>) -> Self {
        self.beans.push((id.into(), entry.into()));
        self
    }

    /// 批量注册显式条目
    pub fn with_beans<I, S>(mut self, beans: I) -> Self
    where
        I: IntoIterator<Item = (S, BeanEntry)>,
        S: Into<String>,
    {
        self.beans
            .extend(beans.into_iter().map(|(id, entry)| (id.into(), entry)));
        self
    }

    /// 添加显式组件
    pub fn with_component(mut self, component: impl Into<Arc<TypeMetadata>>) -> Self {
        self.components.push(component.into());
        self
    }

    /// 批量添加显式组件
    pub fn with_components<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = Arc<TypeMetadata>>,
    {
        self.components.extend(components);
        self
    }

    /// 添加临时工厂
    pub fn with_factory(mut self, id: impl Into<String>, factory: AdHocFactory) -> Self {
        self.factories.push((id.into(), factory));
        self
    }

    /// 批量添加临时工厂
    pub fn with_factories<I, S>(mut self, factories: I) -> Self
    where
        I: IntoIterator<Item = (S, AdHocFactory)>,
        S: Into<String>,
    {
        self.factories
            .extend(factories.into_iter().map(|(id, f)| (id.into(), f)));
        self
    }

    /// 添加注册配置器
    pub fn with_configurator(mut self, configurator: Arc<dyn RegistererConfigurator>) -> Self {
        self.configurators.push(configurator);
        self
    }

    /// 替换组件扫描器，默认扫描全局组件清单
    pub fn with_scanner(mut self, scanner: Arc<dyn ComponentScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// 替换元数据源，默认使用全局组件清单
    pub fn with_metadata_source(mut self, metadata_source: Arc<dyn MetadataSource>) -> Self {
        self.metadata_source = Some(metadata_source);
        self
    }

    /// 设置外部缓存
    pub fn with_cache(mut self, cache: Arc<dyn BeanCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 设置事件派发器
    pub fn with_event_dispatcher(mut self, events: Arc<dyn EventNotifier>) -> Self {
        self.events = Some(events);
        self
    }

    /// 在多次构建之间共享接口实现缓存
    pub fn with_implementation_cache(mut self, cache: Arc<ImplementationCache>) -> Self {
        self.implementation_cache = Some(cache);
        self
    }

    /// 使用指纹账本判断外部缓存的新鲜度
    ///
    /// 构建时加载账本并替代元数据源，构建成功后写回所有类型当前的指纹。
    /// 与 [`ContainerBuilder::with_metadata_source`] 同时设置时以账本为准。
    pub fn with_fingerprint_ledger(mut self, path: impl AsRef<Path>) -> Self {
        self.fingerprint_ledger = Some(path.as_ref().to_path_buf());
        self
    }

    /// 启用调试模式
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.container_config = self.container_config.with_debug(debug);
        self
    }

    /// 设置外部缓存键前缀
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.container_config = self.container_config.with_cache_prefix(prefix);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建容器
    ///
    /// 依次写入配置值和显式条目，然后执行完整的 Bean 注册
    pub async fn build(self) -> InfrastructureResult<Arc<Container>> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging()?;
        }
        info!("开始构建容器");

        let ledger = match &self.fingerprint_ledger {
            Some(path) => Some(Arc::new(
                ManifestMetadataSource::from_global_manifest().with_ledger(path)?,
            )),
            None => None,
        };
        let metadata_source: Arc<dyn MetadataSource> = match &ledger {
            Some(ledger) => ledger.clone(),
            None => self
                .metadata_source
                .unwrap_or_else(|| Arc::new(ManifestMetadataSource::from_global_manifest())),
        };
        let container = Container::create(
            self.container_config,
            self.events
                .unwrap_or_else(|| Arc::new(EventDispatcher::new())),
            self.cache.unwrap_or_else(|| Arc::new(NullBeanCache)),
            metadata_source.clone(),
        );

        let mut loader = ConfigLoader::new();
        for provider in self.config_sources {
            loader.add_boxed_provider(provider);
        }
        let values = loader.register(&*container).await?;
        info!("已注册 {} 个配置值", values);

        for (id, entry) in self.beans {
            if let (Some(ledger), Some(metadata)) = (&ledger, entry.metadata()) {
                ledger.register(metadata.clone());
            }
            container.set(id, entry);
        }
        if let Some(ledger) = &ledger {
            for component in &self.components {
                ledger.register(component.clone());
            }
        }

        let scanner = self
            .scanner
            .unwrap_or_else(|| Arc::new(ManifestComponentScanner::new()));
        let mut generator = self
            .implementation_cache
            .map(ImplementationGenerator::with_cache)
            .unwrap_or_default();
        if let Some(ledger) = &ledger {
            generator = generator.with_ledger(ledger.clone());
        }

        let mut registerer = BeanRegisterer::new(scanner, container.clone())
            .with_metadata_source(metadata_source)
            .with_generator(generator)
            .with_namespaces(self.namespaces)
            .with_behaviors(self.stereotypes)
            .with_components(self.components)
            .with_factories(self.factories);
        for configurator in self.configurators {
            registerer = registerer.with_configurator(configurator);
        }
        registerer.register_beans().await?;

        if let Some(ledger) = &ledger {
            ledger.save_current()?;
        }
        info!("容器构建完成");
        Ok(container)
    }

    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let level = self.logging_config.level;
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别，`RUST_LOG` 存在时以其为准
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_impl::MemoryBeanCache;
    use infrastructure_common::{
        conventions, Annotation, Bean, MethodMetadata, ParamMetadata, TypeKind,
    };
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{NamedTempFile, TempDir};

    fn temp_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        writeln!(file, "{content}").expect("write");
        file
    }

    #[derive(Debug)]
    struct Endpoint {
        url: String,
    }

    fn endpoint_metadata() -> TypeMetadata {
        TypeMetadata::new("app::http::Endpoint", TypeKind::Class)
            .annotated(conventions::COMPONENT)
            .with_constructor(
                vec![ParamMetadata::new("url").with_override("http.url")],
                |args| {
                    Ok(Bean::object(Endpoint {
                        url: args.value(0)?,
                    }))
                },
            )
    }

    fn empty_scanner() -> Arc<dyn ComponentScanner> {
        Arc::new(ManifestComponentScanner::from_metadata(Vec::new()))
    }

    #[tokio::test]
    async fn test_build_registers_config_values_before_components() {
        let file = temp_config(".yaml", "http:\n  url: http://localhost:8080\n  retries: 3");

        let container = ContainerBuilder::new()
            .add_config_yaml(file.path())
            .expect("yaml")
            .with_scanner(empty_scanner())
            .with_component(endpoint_metadata())
            .build()
            .await
            .expect("build");

        let endpoint = container
            .get_object::<Endpoint>("app::http::Endpoint")
            .expect("endpoint");
        assert_eq!(endpoint.url, "http://localhost:8080");
        assert!(container.has("http"));
        assert_eq!(
            container.get("http.retries").expect("retries").to_value::<i64>(),
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_explicit_beans_override_config_values() {
        let file = temp_config(".json", r#"{"http": {"url": "from-file"}}"#);

        let container = ContainerBuilder::new()
            .add_config_json(file.path())
            .expect("json")
            .with_bean("http.url", Bean::value("explicit"))
            .with_scanner(empty_scanner())
            .with_component(endpoint_metadata())
            .build()
            .await
            .expect("build");

        let endpoint = container
            .get_object::<Endpoint>("app::http::Endpoint")
            .expect("endpoint");
        assert_eq!(endpoint.url, "explicit");
    }

    #[tokio::test]
    async fn test_namespaces_limit_scanning() {
        let scanner = Arc::new(ManifestComponentScanner::from_metadata(vec![Arc::new(
            endpoint_metadata(),
        )]));

        let container = ContainerBuilder::new()
            .with_bean("http.url", Bean::value("x"))
            .with_namespaces(["app::billing"])
            .with_scanner(scanner)
            .build()
            .await
            .expect("build");

        assert!(!container.has("app::http::Endpoint"));
    }

    #[tokio::test]
    async fn test_custom_stereotype_and_debug_options() {
        let repository = TypeMetadata::new("app::UserRepository", TypeKind::Class)
            .with_annotation(Annotation::new("Repository").with_attribute("name", "users"))
            .with_constructor(Vec::new(), |_| Ok(Bean::value("users")));
        let scanner = Arc::new(ManifestComponentScanner::from_metadata(vec![Arc::new(
            repository,
        )]));

        let container = ContainerBuilder::new()
            .with_stereotypes(["Repository"])
            .with_scanner(scanner)
            .with_cache(Arc::new(MemoryBeanCache::new()))
            .with_cache_prefix("test.")
            .with_debug(true)
            .build()
            .await
            .expect("build");

        assert!(container.config().debug);
        assert_eq!(container.config().cache_prefix, "test.");
        assert!(container.has("users"));
        assert!(container.get("users").expect("users").is_scalar());
    }

    #[tokio::test]
    async fn test_missing_config_file_fails() {
        let result = ContainerBuilder::new().add_config_toml("/nonexistent/beans.toml");
        assert!(matches!(
            result,
            Err(InfrastructureError::ConfigError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_config_value_surfaces_on_get() {
        let container = ContainerBuilder::new()
            .with_scanner(empty_scanner())
            .with_component(endpoint_metadata())
            .build()
            .await
            .expect("build");

        let error = container.get("app::http::Endpoint").unwrap_err();
        assert!(error.root_cause().is_not_found());
    }

    fn clock_metadata(calls: Arc<AtomicUsize>, methods: &[&str]) -> TypeMetadata {
        let mut metadata = TypeMetadata::new("app::Clock", TypeKind::Class)
            .annotated(conventions::COMPONENT)
            .with_constructor(Vec::new(), move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Bean::value("tick"))
            });
        for method in methods {
            metadata = metadata.with_method(MethodMetadata::new("app::Clock", *method));
        }
        metadata
    }

    #[tokio::test]
    async fn test_fingerprint_ledger_reuses_cache_across_builds() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = dir.path().join("cache").join("fingerprints.json");
        let cache = Arc::new(MemoryBeanCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let build = |methods: &[&str]| {
            ContainerBuilder::new()
                .with_scanner(empty_scanner())
                .with_component(clock_metadata(calls.clone(), methods))
                .with_cache(cache.clone())
                .with_debug(true)
                .with_fingerprint_ledger(&ledger)
                .build()
        };

        let first = build(&["now"]).await.expect("first build");
        assert!(!first.is_fresh("app::Clock"));
        first.get("app::Clock").expect("clock");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ledger.exists());
        drop(first);

        let second = build(&["now"]).await.expect("second build");
        assert!(second.is_fresh("app::Clock"));
        second.get("app::Clock").expect("cached clock");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        drop(second);

        let changed = build(&["now", "stop"]).await.expect("changed build");
        assert!(!changed.is_fresh("app::Clock"));
        changed.get("app::Clock").expect("rebuilt clock");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_logging_presets() {
        assert!(LoggingConfig::production().json_format);
        assert_eq!(LoggingConfig::development().level, tracing::Level::DEBUG);
        assert!(!LoggingConfig::default().json_format);
    }
}
