//! 接口实现器
//!
//! 为只有接口条目的标识合成实现：按方法名分发到实现器提供的方法体，
//! 生成的元数据按接口指纹缓存。

use dashmap::DashMap;
use di_impl::{Container, ManifestMetadataSource};
use infrastructure_common::{
    Arguments, Bean, BoxError, ComponentError, ComponentResult, MethodDispatcher, MethodMetadata,
    ParamMetadata, TypeKind, TypeMetadata,
};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 生成方法的方法体
pub type MethodBody =
    Arc<dyn Fn(&GeneratedInstance, Arguments) -> Result<Bean, BoxError> + Send + Sync>;

/// 接口实现器
///
/// 负责某一类接口（由 `behavior_name` 标记）的实现合成
pub trait InterfaceImplementor: Send + Sync {
    /// 处理的接口标记
    fn behavior_name(&self) -> String;

    /// 不生成实现的方法
    fn blacklisted_methods(&self) -> Vec<String> {
        Vec::new()
    }

    /// 生成单个方法的方法体
    fn implement_method_body(
        &self,
        method: &MethodMetadata,
        interface: &TypeMetadata,
    ) -> MethodBody;

    /// 方法生成完成后调整生成类型，例如追加构造依赖
    fn post_process(
        &self,
        _interface: &TypeMetadata,
        _generated: &mut GeneratedType,
        _container: &Container,
    ) -> ComponentResult<()> {
        Ok(())
    }

    /// 是否处理该接口
    fn accept(&self, interface: &TypeMetadata) -> bool {
        let behavior = self.behavior_name();
        interface.has_annotation(&behavior)
            || interface.is_instance_of(&behavior)
            || interface.implements_interface(&behavior)
    }
}

/// 生成中的实现类型
pub struct GeneratedType {
    name: String,
    interface: String,
    methods: Vec<(MethodMetadata, MethodBody)>,
    dependencies: Vec<ParamMetadata>,
}

impl GeneratedType {
    /// 为接口创建空的生成类型，名称为 `<接口>Impl`
    pub fn new(interface: &TypeMetadata) -> Self {
        let base = interface.name.trim_start_matches("dyn ");
        Self {
            name: format!("{base}Impl"),
            interface: interface.name.clone(),
            methods: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// 生成类型名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 实现的接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 添加方法
    pub fn add_method(&mut self, method: MethodMetadata, body: MethodBody) -> &mut Self {
        self.methods.push((method, body));
        self
    }

    /// 追加构造依赖，生成实例可按参数名读取
    pub fn add_dependency(&mut self, param: ParamMetadata) -> &mut Self {
        self.dependencies.push(param);
        self
    }

    /// 已生成的方法名称
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|(m, _)| m.name.as_str()).collect()
    }

    /// 构造依赖
    pub fn dependencies(&self) -> &[ParamMetadata] {
        &self.dependencies
    }

    /// 类源码形式的描述，用于诊断日志
    pub fn render(&self) -> String {
        let mut out = format!("struct {} implements {} {{\n", self.name, self.interface);
        let params: Vec<String> = self
            .dependencies
            .iter()
            .map(|p| format!("{}: {}", p.name, p.declared_type.as_deref().unwrap_or("_")))
            .collect();
        out.push_str(&format!("    fn new({})\n", params.join(", ")));
        for (method, _) in &self.methods {
            let params: Vec<String> = method
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.declared_type.as_deref().unwrap_or("_")))
                .collect();
            out.push_str(&format!(
                "    fn {}({}) -> {}\n",
                method.name,
                params.join(", "),
                method.return_type.as_deref().unwrap_or("()")
            ));
        }
        out.push('}');
        out
    }

    /// 转换为可注册的类型元数据
    ///
    /// 构造函数创建分发表实例，接口声明了代理时返回代理包装后的接口视图
    pub fn into_metadata(self, interface: &TypeMetadata) -> TypeMetadata {
        let bodies: Arc<HashMap<String, MethodBody>> = Arc::new(
            self.methods
                .iter()
                .map(|(method, body)| (method.name.clone(), body.clone()))
                .collect(),
        );
        let param_names: Vec<String> = self.dependencies.iter().map(|p| p.name.clone()).collect();
        let proxy = interface.proxy.clone();
        let type_name = self.name.clone();

        let mut metadata =
            TypeMetadata::new(self.name.clone(), TypeKind::Class).with_interface(&interface.name);
        for (method, _) in self.methods {
            let name = method.name.clone();
            let mut implemented = method;
            implemented.owner = String::new();
            implemented.is_abstract = false;
            metadata = metadata.with_method(implemented.with_invoker(move |target, args| {
                let instance = target
                    .downcast::<GeneratedInstance>()
                    .ok_or_else(|| format!("目标不是生成实例: {name}"))?;
                instance.dispatch(&name, args)
            }));
        }

        metadata.with_constructor(self.dependencies, move |args| {
            let dependencies = param_names
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    args.get(index).map(|bean| (name.clone(), bean.clone()))
                })
                .collect();
            let instance = Arc::new(GeneratedInstance {
                type_name: type_name.clone(),
                bodies: bodies.clone(),
                dependencies,
            });
            Ok(match &proxy {
                Some(proxy) => {
                    let dispatcher: Arc<dyn MethodDispatcher> = instance;
                    proxy(dispatcher)
                }
                None => Bean::from_arc(instance),
            })
        })
    }
}

impl fmt::Debug for GeneratedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedType")
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("methods", &self.method_names())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// 生成实现的实例
pub struct GeneratedInstance {
    type_name: String,
    bodies: Arc<HashMap<String, MethodBody>>,
    dependencies: HashMap<String, Bean>,
}

impl GeneratedInstance {
    /// 生成类型名称
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 按参数名获取构造依赖
    pub fn dependency(&self, name: &str) -> Option<&Bean> {
        self.dependencies.get(name)
    }

    /// 按参数名获取对象依赖
    pub fn object<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, BoxError> {
        self.dependency(name)
            .and_then(Bean::downcast::<T>)
            .ok_or_else(|| format!("{} 缺少依赖: {}", self.type_name, name).into())
    }

    /// 按参数名获取配置值依赖
    pub fn value<V: DeserializeOwned>(&self, name: &str) -> Result<V, BoxError> {
        self.dependency(name)
            .and_then(Bean::to_value::<V>)
            .ok_or_else(|| format!("{} 缺少配置值: {}", self.type_name, name).into())
    }
}

impl MethodDispatcher for GeneratedInstance {
    fn dispatch(&self, method: &str, args: Arguments) -> Result<Bean, BoxError> {
        match self.bodies.get(method) {
            Some(body) => body(self, args),
            None => Err(format!("{} 没有实现方法: {}", self.type_name, method).into()),
        }
    }

    fn handles(&self, method: &str) -> bool {
        self.bodies.contains_key(method)
    }
}

impl fmt::Debug for GeneratedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedInstance")
            .field("type_name", &self.type_name)
            .field("dependencies", &self.dependencies.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// 生成实现的缓存
///
/// 按实现器标记和接口名称保存，接口指纹变化后失效
#[derive(Default)]
pub struct ImplementationCache {
    entries: DashMap<(String, String), (String, Arc<TypeMetadata>)>,
}

impl ImplementationCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取与指纹匹配的生成元数据
    pub fn get(
        &self,
        behavior: &str,
        interface: &str,
        fingerprint: &str,
    ) -> Option<Arc<TypeMetadata>> {
        self.entries
            .get(&(behavior.to_string(), interface.to_string()))
            .filter(|entry| entry.0 == fingerprint)
            .map(|entry| entry.1.clone())
    }

    /// 保存生成元数据
    pub fn insert(
        &self,
        behavior: impl Into<String>,
        interface: impl Into<String>,
        fingerprint: String,
        metadata: Arc<TypeMetadata>,
    ) {
        self.entries
            .insert((behavior.into(), interface.into()), (fingerprint, metadata));
    }

    /// 移除接口在所有实现器下的缓存
    pub fn invalidate(&self, interface: &str) {
        self.entries.retain(|(_, cached), _| cached != interface);
    }

    /// 缓存条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ImplementationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// 实现生成器
///
/// 关联指纹账本后，生成的类型加入账本，其实例在外部缓存中的新鲜度随接口指纹判断
#[derive(Clone, Default)]
pub struct ImplementationGenerator {
    cache: Arc<ImplementationCache>,
    ledger: Option<Arc<ManifestMetadataSource>>,
}

impl ImplementationGenerator {
    /// 使用独立缓存创建生成器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用共享缓存创建生成器
    pub fn with_cache(cache: Arc<ImplementationCache>) -> Self {
        Self {
            cache,
            ledger: None,
        }
    }

    /// 关联指纹账本
    pub fn with_ledger(mut self, ledger: Arc<ManifestMetadataSource>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// 生成实现的缓存
    pub fn cache(&self) -> &Arc<ImplementationCache> {
        &self.cache
    }

    /// 为接口的每个抽象方法生成方法体，跳过黑名单方法
    pub fn create_generated_type(
        &self,
        implementor: &dyn InterfaceImplementor,
        interface: &TypeMetadata,
    ) -> GeneratedType {
        let blacklist = implementor.blacklisted_methods();
        let mut generated = GeneratedType::new(interface);
        for method in interface.abstract_methods() {
            if blacklist.iter().any(|name| name == &method.name) {
                continue;
            }
            let body = implementor.implement_method_body(method, interface);
            generated.add_method(method.clone(), body);
        }
        generated
    }

    /// 生成接口实现的元数据，接口未变化时复用缓存
    pub fn implement(
        &self,
        implementor: &dyn InterfaceImplementor,
        interface: &Arc<TypeMetadata>,
        container: &Container,
    ) -> ComponentResult<Arc<TypeMetadata>> {
        let behavior = implementor.behavior_name();
        let fingerprint = interface.fingerprint();
        if let Some(cached) = self.cache.get(&behavior, &interface.name, &fingerprint) {
            debug!("复用接口实现: {}", cached.name);
            self.track(&cached);
            return Ok(cached);
        }

        let mut generated = self.create_generated_type(implementor, interface);
        implementor
            .post_process(interface, &mut generated, container)
            .map_err(|e| match e {
                ComponentError::GenerationError { .. } => e,
                other => ComponentError::generation_error(&interface.name, other.to_string()),
            })?;
        debug!("生成接口实现:\n{}", generated.render());

        let metadata = Arc::new(generated.into_metadata(interface));
        self.cache
            .insert(behavior.as_str(), interface.name.as_str(), fingerprint, metadata.clone());
        self.track(&metadata);
        info!("接口 {} 由 {} 实现为 {}", interface.name, behavior, metadata.name);
        Ok(metadata)
    }

    fn track(&self, metadata: &Arc<TypeMetadata>) {
        if let Some(ledger) = &self.ledger {
            ledger.register(metadata.clone());
        }
    }
}

impl fmt::Debug for ImplementationGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationGenerator")
            .field("cache", &self.cache)
            .field("ledger", &self.ledger.as_ref().and_then(|l| l.ledger_path()))
            .finish()
    }
}
