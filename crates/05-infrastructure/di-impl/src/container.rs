//! 依赖注入容器
//!
//! 按标识管理 Bean：查找条目、解析依赖、创建实例并缓存

use crate::cache::NullBeanCache;
use crate::events::EventDispatcher;
use crate::resolver::DependencyResolver;
use di_abstractions::{
    AfterInstanceBeanEvent, AlwaysFresh, BeanCache, BeforeInstanceBeanEvent, ComponentDirectory,
    ContainerConfig, DependencySource, EventNotifier, MetadataSource,
};
use infrastructure_common::{
    AdHocFactory, Bean, BeanContainer, BeanEntry, BoxError, ConstructionStatus, ContainerError,
    ContainerResult, MethodMetadata, NamingConventions, TypeMetadata,
};
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// 依赖注入容器
///
/// 同一标识最多创建一次实例。整个创建过程在可重入的构建锁内执行：
/// 同一线程上的嵌套解析可以继续，其他线程等待。
pub struct Container {
    directory: RwLock<ComponentDirectory>,
    instances: RwLock<HashMap<String, Bean>>,
    statuses: RwLock<HashMap<String, ConstructionStatus>>,
    build_lock: ReentrantMutex<()>,
    resolver: DependencyResolver,
    events: Arc<dyn EventNotifier>,
    cache: Arc<dyn BeanCache>,
    metadata_source: Arc<dyn MetadataSource>,
    config: ContainerConfig,
    self_ref: Weak<Container>,
}

impl Container {
    /// 使用默认协作者创建容器
    pub fn new() -> Arc<Self> {
        Self::create(
            ContainerConfig::default(),
            Arc::new(EventDispatcher::new()),
            Arc::new(NullBeanCache),
            Arc::new(AlwaysFresh),
        )
    }

    /// 使用指定配置和协作者创建容器
    pub fn create(
        config: ContainerConfig,
        events: Arc<dyn EventNotifier>,
        cache: Arc<dyn BeanCache>,
        metadata_source: Arc<dyn MetadataSource>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            directory: RwLock::new(ComponentDirectory::new()),
            instances: RwLock::new(HashMap::new()),
            statuses: RwLock::new(HashMap::new()),
            build_lock: ReentrantMutex::new(()),
            resolver: DependencyResolver::new(),
            events,
            cache,
            metadata_source,
            config,
            self_ref: self_ref.clone(),
        })
    }

    /// 容器自身的标识
    pub fn id() -> &'static str {
        std::any::type_name::<Container>()
    }

    /// 容器查找接口的标识
    pub fn interface_id() -> &'static str {
        std::any::type_name::<dyn BeanContainer>()
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 标识是否可解析
    ///
    /// 任意条目已注册，或外部缓存中有新鲜的实例时返回 `true`
    pub fn has(&self, id: &str) -> bool {
        self.is_self_id(id)
            || self.directory.read().contains(id)
            || self.instances.read().contains_key(id)
            || self.has_fresh_cache_entry(id)
    }

    /// 获取 Bean，必要时创建
    pub fn get(&self, id: &str) -> ContainerResult<Bean> {
        if let Some(bean) = self.self_bean(id) {
            return Ok(bean);
        }
        if let Some(bean) = self.cached(id) {
            return Ok(bean);
        }

        let _guard = self.build_lock.lock();
        // 等待构建锁期间其他线程可能已完成创建
        if let Some(bean) = self.cached(id) {
            return Ok(bean);
        }
        if !self.has(id) {
            return Err(ContainerError::not_found(id));
        }
        if self.status(id).is_in_progress() {
            return Err(ContainerError::circular(id, id));
        }

        self.build(id)
    }

    /// 获取并向下转型为具体类型
    pub fn get_object<T: Any + Send + Sync>(&self, id: &str) -> ContainerResult<Arc<T>> {
        self.get(id)?.downcast::<T>().ok_or_else(|| {
            ContainerError::invalid_entry(
                id,
                format!("类型不匹配, 期望 {}", std::any::type_name::<T>()),
            )
        })
    }

    /// 以类型名称为标识获取对象
    pub fn resolve<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        self.get_object::<T>(std::any::type_name::<T>())
    }

    /// 以接口名称为标识获取接口视图
    pub fn resolve_interface<I: ?Sized + Send + Sync + 'static>(&self) -> ContainerResult<Arc<I>> {
        let id = std::any::type_name::<I>();
        self.get(id)?
            .as_interface::<I>()
            .ok_or_else(|| ContainerError::invalid_entry(id, "不是接口视图"))
    }

    /// 注册条目，覆盖已有条目
    ///
    /// 注册实例会替换已创建的实例；其他条目不影响已创建的实例，
    /// 需要重新创建时调用 [`Container::invalidate`]
    pub fn set(&self, id: impl Into<String>, entry: impl Into<BeanEntry>) -> &Self {
        let id = id.into();
        let entry = entry.into();
        debug!("注册 Bean 条目: {} ({})", id, entry.kind());

        if matches!(entry, BeanEntry::Instance(_)) {
            self.instances.write().remove(&id);
        }
        self.directory.write().insert(id, entry);
        self
    }

    /// 注册类型，接口元数据会注册为接口条目
    pub fn set_type(&self, id: impl Into<String>, metadata: impl Into<Arc<TypeMetadata>>) -> &Self {
        self.set(id, BeanEntry::from_metadata(metadata.into()))
    }

    /// 注册工厂方法
    pub fn set_factory_method(&self, id: impl Into<String>, method: MethodMetadata) -> &Self {
        self.set(id, BeanEntry::FactoryMethod(Arc::new(method)))
    }

    /// 注册临时工厂
    pub fn set_factory(&self, id: impl Into<String>, factory: AdHocFactory) -> &Self {
        self.set(id, BeanEntry::AdHoc(factory))
    }

    /// 注册实例
    pub fn set_instance(&self, id: impl Into<String>, bean: Bean) -> &Self {
        self.set(id, BeanEntry::Instance(bean))
    }

    /// 注册配置值
    pub fn set_value(&self, id: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.set(id, BeanEntry::Instance(Bean::value(value)))
    }

    /// 丢弃已创建的实例，下次获取时重新创建
    ///
    /// 共享同一实例的别名和接口标识一并失效
    pub fn invalidate(&self, id: &str) {
        let _guard = self.build_lock.lock();
        let ids = self.directory.read().sharing_ids(id);
        {
            let mut instances = self.instances.write();
            let mut statuses = self.statuses.write();
            for shared in &ids {
                instances.remove(shared);
                statuses.remove(shared);
            }
        }

        for shared in &ids {
            let key = self.cache_key(shared);
            if let Err(e) = self.cache.delete(&key) {
                warn!("删除缓存失败: {}, 原因: {}", key, e);
            }
        }
        debug!("已失效 Bean: {} ({} 个标识)", id, ids.len());
    }

    /// 所有已注册的标识，包括容器自身
    pub fn ids(&self) -> Vec<String> {
        let mut ids = vec![Self::id().to_string(), Self::interface_id().to_string()];
        ids.extend(self.directory.read().ids().map(str::to_string));
        let instances = self.instances.read();
        let mut built: Vec<&String> = instances
            .keys()
            .filter(|id| !ids.contains(*id))
            .collect();
        built.sort();
        ids.extend(built.into_iter().cloned());
        ids
    }

    /// 获取条目
    pub fn entry(&self, id: &str) -> Option<BeanEntry> {
        self.directory.read().get(id).cloned()
    }

    /// 标识是否对应类型元数据
    pub fn has_metadata(&self, id: &str) -> bool {
        self.directory.read().metadata(id).is_some()
    }

    /// 获取标识对应的类型元数据
    pub fn get_metadata(&self, id: &str) -> Option<Arc<TypeMetadata>> {
        self.directory.read().metadata(id)
    }

    /// 所有接口条目
    pub fn interface_entries(&self) -> Vec<(String, Arc<TypeMetadata>)> {
        self.directory.read().interface_entries()
    }

    /// 带有指定标记的类型的主标识和元数据
    pub fn components(&self, marker: &str) -> Vec<(String, Arc<TypeMetadata>)> {
        self.directory.read().by_component(marker)
    }

    /// 获取带有指定标记的所有类型元数据
    pub fn get_metadata_by_component(&self, marker: &str) -> Vec<Arc<TypeMetadata>> {
        self.components(marker)
            .into_iter()
            .map(|(_, metadata)| metadata)
            .collect()
    }

    /// 获取带有指定标记的所有 Bean
    pub fn get_beans_by_component(&self, marker: &str) -> ContainerResult<Vec<Bean>> {
        self.components(marker)
            .into_iter()
            .map(|(id, _)| self.get(&id))
            .collect()
    }

    /// 标识的创建状态
    pub fn status(&self, id: &str) -> ConstructionStatus {
        self.statuses.read().get(id).copied().unwrap_or_default()
    }

    /// 推断条目的 Bean 名称
    pub fn guess_bean_name(&self, entry: &BeanEntry) -> Option<String> {
        NamingConventions::guess_bean_name(entry)
    }

    /// 标识是否新鲜，非调试模式下总是新鲜
    pub fn is_fresh(&self, id: &str) -> bool {
        if !self.config.debug {
            return true;
        }
        self.get_metadata(id)
            .is_some_and(|metadata| self.metadata_source.is_fresh(&metadata.name))
    }

    /// 作为查找接口的共享引用
    pub fn as_bean_container(&self) -> Weak<dyn BeanContainer> {
        self.self_ref.clone()
    }

    fn is_self_id(&self, id: &str) -> bool {
        id == Self::id() || id == Self::interface_id()
    }

    fn self_bean(&self, id: &str) -> Option<Bean> {
        let this = self.self_ref.upgrade()?;
        if id == Self::id() {
            Some(Bean::from_arc(this))
        } else if id == Self::interface_id() {
            let container: Arc<dyn BeanContainer> = this;
            Some(Bean::interface::<dyn BeanContainer>(container))
        } else {
            None
        }
    }

    fn cached(&self, id: &str) -> Option<Bean> {
        if let Some(bean) = self.instances.read().get(id) {
            return Some(bean.clone());
        }
        match self.directory.read().get(id) {
            Some(BeanEntry::Instance(bean)) => Some(bean.clone()),
            _ => None,
        }
    }

    fn cache_key(&self, id: &str) -> String {
        NamingConventions::cache_key(&self.config.cache_prefix, id)
    }

    fn has_fresh_cache_entry(&self, id: &str) -> bool {
        let key = self.cache_key(id);
        match self.cache.has(&key) {
            Ok(found) => found && self.is_fresh(id),
            Err(e) => {
                warn!("读取缓存失败: {}, 原因: {}", key, e);
                false
            }
        }
    }

    fn load_from_cache(&self, id: &str) -> Option<Bean> {
        if !self.has_fresh_cache_entry(id) {
            return None;
        }
        let key = self.cache_key(id);
        match self.cache.get(&key) {
            Ok(bean) => bean,
            Err(e) => {
                warn!("读取缓存失败: {}, 原因: {}", key, e);
                None
            }
        }
    }

    fn store_in_cache(&self, id: &str, bean: &Bean) {
        let key = self.cache_key(id);
        if let Err(e) = self.cache.set(&key, bean) {
            warn!("写入缓存失败: {}, 原因: {}", key, e);
        }
    }

    fn set_status(&self, id: &str, status: ConstructionStatus) {
        let mut statuses = self.statuses.write();
        if status == ConstructionStatus::NotStarted {
            statuses.remove(id);
        } else {
            statuses.insert(id.to_string(), status);
        }
    }

    fn complete(&self, id: &str, bean: &Bean) {
        self.set_status(id, ConstructionStatus::Completed);
        self.instances.write().insert(id.to_string(), bean.clone());
    }

    fn inject_container(&self, bean: &Bean) {
        if let Some(aware) = bean.container_aware() {
            aware.set_container(self.as_bean_container());
        }
    }

    /// 在构建锁内创建 Bean
    fn build(&self, id: &str) -> ContainerResult<Bean> {
        if let Some(bean) = self.load_from_cache(id) {
            debug!("外部缓存命中: {}", id);
            self.complete(id, &bean);
            self.inject_container(&bean);
            return Ok(bean);
        }

        let (entry, primary) = {
            let directory = self.directory.read();
            let entry = directory
                .get(id)
                .cloned()
                .ok_or_else(|| ContainerError::not_found(id))?;
            (entry, directory.primary_id(id).map(str::to_string))
        };

        // 别名和接口标识共享类型自身标识下的实例
        if let (Some(primary), BeanEntry::Type(metadata)) = (primary, &entry) {
            let shared = self.get(&primary)?;
            let bean = metadata.view_as(id, &shared).unwrap_or(shared);
            self.complete(id, &bean);
            return Ok(bean);
        }

        if let BeanEntry::Interface(metadata) = &entry {
            return Err(ContainerError::invalid_entry(
                id,
                format!("接口没有实现: {}", metadata.name),
            ));
        }

        debug!("创建 Bean: {} ({})", id, entry.kind());
        self.set_status(id, ConstructionStatus::InProgress);

        match self.instantiate(id, &entry) {
            Ok(bean) => {
                let bean = match &entry {
                    BeanEntry::Type(metadata) if metadata.name != id => {
                        metadata.view_as(id, &bean).unwrap_or(bean)
                    }
                    _ => bean,
                };
                self.complete(id, &bean);
                self.store_in_cache(id, &bean);
                self.inject_container(&bean);
                Ok(bean)
            }
            Err(e) => {
                self.set_status(id, ConstructionStatus::NotStarted);
                Err(e)
            }
        }
    }

    fn instantiate(&self, id: &str, entry: &BeanEntry) -> ContainerResult<Bean> {
        let args = self
            .resolver
            .resolve(self, entry.params(), id)
            .map_err(|e| wrap_dependency_error(id, e))?;

        let mut before =
            BeforeInstanceBeanEvent::new(id, entry.metadata().cloned(), entry.kind());
        self.events.dispatch(&mut before);

        let result = match entry {
            BeanEntry::FactoryMethod(method) => {
                let owner = self
                    .get(&method.owner)
                    .map_err(|e| wrap_dependency_error(id, e))?;
                method.invoke(&owner, args)
            }
            BeanEntry::AdHoc(factory) => factory.call(args),
            BeanEntry::Type(metadata) => metadata.instantiate(args),
            BeanEntry::Instance(_) | BeanEntry::Interface(_) => {
                return Err(ContainerError::invalid_entry(id, "条目不可创建"));
            }
        };
        let bean = result.map_err(|e| instantiation_error(id, e))?;

        let mut after = AfterInstanceBeanEvent::new(id, bean.clone());
        self.events.dispatch(&mut after);

        Ok(bean)
    }
}

/// 用正在创建的 Bean 标识包装依赖错误，循环依赖错误原样传播
fn wrap_dependency_error(id: &str, error: ContainerError) -> ContainerError {
    if matches!(error, ContainerError::CircularReference { .. }) {
        error
    } else {
        ContainerError::construction(id, error)
    }
}

fn instantiation_error(id: &str, error: BoxError) -> ContainerError {
    match error.downcast::<ContainerError>() {
        Ok(inner) => wrap_dependency_error(id, *inner),
        Err(other) => ContainerError::instantiation(id, other.to_string()),
    }
}

impl DependencySource for Container {
    fn contains(&self, id: &str) -> bool {
        self.has(id)
    }

    fn status(&self, id: &str) -> ConstructionStatus {
        Container::status(self, id)
    }

    fn is_scalar(&self, id: &str) -> bool {
        self.cached(id).is_some_and(|bean| bean.is_scalar())
    }

    fn supply(&self, id: &str) -> ContainerResult<Bean> {
        self.get(id)
    }
}

impl BeanContainer for Container {
    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }

    fn get(&self, id: &str) -> ContainerResult<Bean> {
        Container::get(self, id)
    }

    fn set(&self, id: &str, entry: BeanEntry) {
        Container::set(self, id, entry);
    }

    fn ids(&self) -> Vec<String> {
        Container::ids(self)
    }

    fn get_metadata(&self, id: &str) -> Option<Arc<TypeMetadata>> {
        Container::get_metadata(self, id)
    }

    fn get_metadata_by_component(&self, marker: &str) -> Vec<Arc<TypeMetadata>> {
        Container::get_metadata_by_component(self, marker)
    }

    fn get_beans_by_component(&self, marker: &str) -> ContainerResult<Vec<Bean>> {
        Container::get_beans_by_component(self, marker)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.directory.read().len())
            .field("instances", &self.instances.read().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
