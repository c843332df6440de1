//! Bean 注册器
//!
//! 扫描构造型、注册组件、处理导入和配置值、注册工厂方法、
//! 绑定接口实现，最后运行构造型处理器。

use crate::implementor::{ImplementationGenerator, InterfaceImplementor};
use crate::post_processors::{inject_value, AutowirePostBeanProcessor, ValuePostBeanProcessor};
use crate::processor::{fetch_stereotypes, PostBeanProcessorRunner, StereotypeProcessor};
use crate::stereotypes;
use di_abstractions::{matches_marker, AlwaysFresh, ComponentScanner, MetadataSource};
use di_impl::Container;
use infrastructure_common::{
    conventions, AdHocFactory, Annotation, ComponentError, ComponentResult, Injectable,
    NamingConventions, TypeMetadata,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 注册配置器
///
/// 在扫描之前调整注册器：追加命名空间、构造型、组件或工厂
pub trait RegistererConfigurator: Send + Sync {
    fn configure(&self, registerer: &mut BeanRegisterer) -> ComponentResult<()>;
}

/// Bean 注册器
pub struct BeanRegisterer {
    scanner: Arc<dyn ComponentScanner>,
    container: Arc<Container>,
    metadata_source: Arc<dyn MetadataSource>,
    generator: ImplementationGenerator,
    namespaces: Vec<String>,
    behaviors: Vec<String>,
    components: Vec<Arc<TypeMetadata>>,
    factories: Vec<(String, AdHocFactory)>,
    configurators: Vec<Arc<dyn RegistererConfigurator>>,
    /// 已注册的元数据，同一类型在多个构造型下共享同一份
    registered: HashMap<String, Arc<TypeMetadata>>,
}

impl BeanRegisterer {
    /// 创建注册器，内置后置处理器作为显式组件注册
    pub fn new(scanner: Arc<dyn ComponentScanner>, container: Arc<Container>) -> Self {
        Self {
            scanner,
            container,
            metadata_source: Arc::new(AlwaysFresh),
            generator: ImplementationGenerator::new(),
            namespaces: Vec::new(),
            behaviors: stereotypes::default_stereotypes(),
            components: vec![
                PostBeanProcessorRunner::metadata(),
                AutowirePostBeanProcessor::metadata(),
                ValuePostBeanProcessor::metadata(),
            ],
            factories: Vec::new(),
            configurators: Vec::new(),
            registered: HashMap::new(),
        }
    }

    /// 设置元数据源，用于查找导入的配置类型和构造型自身的元数据
    pub fn with_metadata_source(mut self, metadata_source: Arc<dyn MetadataSource>) -> Self {
        self.metadata_source = metadata_source;
        self
    }

    /// 设置接口实现生成器
    pub fn with_generator(mut self, generator: ImplementationGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// 追加扫描的命名空间，为空时扫描全部
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces.extend(namespaces);
        self
    }

    /// 追加构造型，排在内置构造型之后
    pub fn with_behaviors(mut self, behaviors: Vec<String>) -> Self {
        for behavior in behaviors {
            self.add_behavior(behavior);
        }
        self
    }

    /// 追加显式组件
    pub fn with_components(mut self, components: Vec<Arc<TypeMetadata>>) -> Self {
        for component in components {
            self.add_component(component);
        }
        self
    }

    /// 追加临时工厂
    pub fn with_factories(mut self, factories: Vec<(String, AdHocFactory)>) -> Self {
        self.factories.extend(factories);
        self
    }

    /// 追加注册配置器，先于扫描发现的配置器运行
    pub fn with_configurator(mut self, configurator: Arc<dyn RegistererConfigurator>) -> Self {
        self.configurators.push(configurator);
        self
    }

    /// 追加扫描的命名空间
    pub fn add_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        let namespace = namespace.into();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    /// 追加构造型
    pub fn add_behavior(&mut self, behavior: impl Into<String>) -> &mut Self {
        let behavior = behavior.into();
        if !self.behaviors.contains(&behavior) {
            self.behaviors.push(behavior);
        }
        self
    }

    /// 追加显式组件，不受命名空间限制
    pub fn add_component(&mut self, component: impl Into<Arc<TypeMetadata>>) -> &mut Self {
        let component = component.into();
        if self.components.iter().all(|c| c.name != component.name) {
            self.components.push(component);
        }
        self
    }

    /// 追加临时工厂
    pub fn add_factory(&mut self, id: impl Into<String>, factory: AdHocFactory) -> &mut Self {
        self.factories.push((id.into(), factory));
        self
    }

    /// 扫描的命名空间
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// 已启用的构造型
    pub fn behaviors(&self) -> &[String] {
        &self.behaviors
    }

    /// 目标容器
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 执行完整的注册流程
    pub async fn register_beans(&mut self) -> ComponentResult<()> {
        info!("开始注册 Bean, 命名空间: {:?}", self.namespaces);

        self.run_configurators().await?;
        self.register_components().await?;
        self.resolve_configuration_values()?;
        self.register_factories();
        self.bind_interfaces()?;
        self.process_stereotypes()?;

        info!("Bean 注册完成, 共 {} 个标识", self.container.ids().len());
        Ok(())
    }

    async fn run_configurators(&mut self) -> ComponentResult<()> {
        let mut configurators = std::mem::take(&mut self.configurators);

        let marker = stereotypes::registerer_configurator();
        for metadata in self.discover(marker).await? {
            let metadata = self.canonical(metadata);
            self.container.set_type(metadata.name.clone(), metadata.clone());
            let bean = self.container.get(&metadata.name)?;
            let configurator = metadata
                .cast::<dyn RegistererConfigurator>(&bean)
                .ok_or_else(|| ComponentError::ConfiguratorError {
                    name: metadata.name.clone(),
                    message: format!("未声明实现 {marker}"),
                })?;
            configurators.push(configurator);
        }

        for configurator in &configurators {
            configurator.configure(self)?;
        }
        debug!("已运行 {} 个注册配置器", configurators.len());
        self.configurators = configurators;
        Ok(())
    }

    async fn register_components(&mut self) -> ComponentResult<()> {
        for behavior in self.behaviors.clone() {
            let found = self.discover(&behavior).await?;
            debug!("构造型 {}: 发现 {} 个类型", behavior, found.len());

            for metadata in found {
                let metadata = self.canonical(metadata);
                self.register_component(&behavior, &metadata);
                self.register_imports(&metadata)?;
            }
            if let Some(marker) = self.metadata_source.get_metadata_for_type(&behavior) {
                self.register_imports(&marker)?;
            }
        }
        Ok(())
    }

    /// 扫描结果加上匹配的显式组件
    async fn discover(&self, marker: &str) -> ComponentResult<Vec<Arc<TypeMetadata>>> {
        let mut found = self.scanner.scan_for_marker(marker, &self.namespaces).await?;
        for component in &self.components {
            let known = found.iter().any(|m| m.name == component.name);
            if !known && matches_marker(component, marker) {
                found.push(component.clone());
            }
        }
        Ok(found)
    }

    fn canonical(&mut self, metadata: Arc<TypeMetadata>) -> Arc<TypeMetadata> {
        self.registered
            .entry(metadata.name.clone())
            .or_insert(metadata)
            .clone()
    }

    /// 以类型名称、别名和实现的接口注册
    fn register_component(&self, marker: &str, metadata: &Arc<TypeMetadata>) {
        self.container.set_type(metadata.name.clone(), metadata.clone());
        if let Some(alias) = NamingConventions::component_alias(metadata, marker) {
            self.container.set_type(alias, metadata.clone());
        }
        for interface in metadata.interface_names() {
            let taken = self
                .container
                .get_metadata(interface)
                .is_some_and(|e| !e.is_interface() && !Arc::ptr_eq(&e, metadata));
            if taken {
                debug!("接口 {} 已有实现, 跳过 {}", interface, metadata.name);
                continue;
            }
            self.container.set_type(interface, metadata.clone());
        }
    }

    /// 注册 `Imports` 注解列出的配置类型
    fn register_imports(&mut self, metadata: &TypeMetadata) -> ComponentResult<()> {
        let imports = metadata
            .get_annotation(conventions::IMPORTS)
            .map(|a| a.string_list(conventions::CONFIGURATIONS_ATTRIBUTE))
            .unwrap_or_default();

        for name in imports {
            let already = self
                .registered
                .get(&name)
                .is_some_and(|m| m.has_annotation(conventions::CONFIGURATION));
            if already {
                continue;
            }

            let imported = self
                .lookup(&name)
                .ok_or_else(|| ComponentError::RegistrationError {
                    type_name: name.clone(),
                    message: format!("{} 导入的配置类型不存在", metadata.name),
                })?;
            let imported = if imported.has_annotation(conventions::CONFIGURATION) {
                imported
            } else {
                let mut tagged = (*imported).clone();
                tagged.annotations.push(Annotation::new(conventions::CONFIGURATION));
                Arc::new(tagged)
            };

            debug!("{} 导入配置类型 {}", metadata.name, name);
            self.registered.insert(name, imported.clone());
            self.register_component(conventions::CONFIGURATION, &imported);
            self.register_imports(&imported)?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Arc<TypeMetadata>> {
        self.registered
            .get(name)
            .or_else(|| self.components.iter().find(|c| c.name == name))
            .cloned()
            .or_else(|| self.metadata_source.get_metadata_for_type(name))
    }

    /// 为配置类的 `Value` 属性注入配置值，失败只记录日志
    fn resolve_configuration_values(&self) -> ComponentResult<()> {
        for (id, metadata) in self.container.components(conventions::CONFIGURATION) {
            let properties = metadata.get_annotated_properties(conventions::VALUE);
            if properties.is_empty() {
                continue;
            }
            let bean = self.container.get(&id)?;
            for property in properties {
                if let Err(message) = inject_value(&self.container, property, &bean) {
                    debug!("无法解析配置值 {}.{}: {}", id, property.name, message);
                }
            }
        }
        Ok(())
    }

    /// 注册配置类的 `Bean` 方法和临时工厂
    fn register_factories(&self) {
        for (_, metadata) in self.container.components(conventions::CONFIGURATION) {
            for method in metadata.get_annotated_methods(conventions::BEAN) {
                let id = method
                    .get_annotation(conventions::BEAN)
                    .and_then(|a| a.string_attribute(conventions::NAME_ATTRIBUTE))
                    .map(str::to_string)
                    .or_else(|| method.return_type.clone())
                    .unwrap_or_else(|| method.name.clone());
                debug!("注册工厂方法: {} -> {}::{}", id, method.owner, method.name);
                self.container.set_factory_method(id, method.clone());
            }
        }

        for (id, factory) in &self.factories {
            self.container.set_factory(id.clone(), factory.clone());
        }
    }

    /// 为接口条目生成实现，第一个接受的实现器生效
    fn bind_interfaces(&self) -> ComponentResult<()> {
        let interfaces = self.container.interface_entries();
        if interfaces.is_empty() {
            return Ok(());
        }

        let marker = stereotypes::interface_implementor();
        let implementors = fetch_stereotypes(&self.container, marker)?
            .iter()
            .map(|s| s.require::<dyn InterfaceImplementor>())
            .collect::<ComponentResult<Vec<_>>>()?;

        for (id, interface) in interfaces {
            let Some(implementor) = implementors.iter().find(|i| i.accept(&interface)) else {
                debug!("接口 {} 没有实现器", id);
                continue;
            };
            let generated = self
                .generator
                .implement(&**implementor, &interface, &self.container)?;
            self.container.set_type(id, generated);
        }
        Ok(())
    }

    fn process_stereotypes(&self) -> ComponentResult<()> {
        let processors = fetch_stereotypes(&self.container, stereotypes::stereotype_processor())?;
        for stereotype in &processors {
            let processor = stereotype.require::<dyn StereotypeProcessor>()?;
            debug!("运行构造型处理器: {}", stereotype.id);
            processor.find_and_process(&self.container)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BeanRegisterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanRegisterer")
            .field("scanner", &self.scanner.name())
            .field("namespaces", &self.namespaces)
            .field("behaviors", &self.behaviors)
            .field("components", &self.components.len())
            .field("factories", &self.factories.len())
            .field("configurators", &self.configurators.len())
            .finish()
    }
}
