//! 构造型处理器与后置处理器

use crate::stereotypes;
use di_impl::Container;
use infrastructure_common::{Bean, ComponentError, ComponentResult, Injectable, TypeMetadata};
use std::sync::Arc;
use tracing::debug;

/// 带有某个构造型的 Bean
#[derive(Debug, Clone)]
pub struct Stereotype {
    /// 注册标识
    pub id: String,
    /// 实例
    pub bean: Bean,
    /// 类型元数据
    pub metadata: Arc<TypeMetadata>,
}

impl Stereotype {
    /// 转换为接口视图
    pub fn cast<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.metadata.cast::<I>(&self.bean)
    }

    /// 转换为接口视图，失败时返回注册错误
    pub fn require<I: ?Sized + Send + Sync + 'static>(&self) -> ComponentResult<Arc<I>> {
        self.cast::<I>().ok_or_else(|| ComponentError::RegistrationError {
            type_name: self.metadata.name.clone(),
            message: format!("未声明实现 {}", std::any::type_name::<I>()),
        })
    }
}

/// 获取带有指定标记的所有 Bean
pub fn fetch_stereotypes(container: &Container, marker: &str) -> ComponentResult<Vec<Stereotype>> {
    container
        .components(marker)
        .into_iter()
        .map(|(id, metadata)| {
            let bean = container.get(&id)?;
            Ok(Stereotype { id, bean, metadata })
        })
        .collect()
}

/// 构造型处理器
///
/// 注册完成后对带有指定构造型的每个 Bean 执行处理
pub trait StereotypeProcessor: Send + Sync {
    /// 处理的构造型标记
    fn stereotype_name(&self) -> String;

    /// 处理单个 Bean
    fn process(&self, stereotype: &Stereotype, container: &Container) -> ComponentResult<()>;

    /// 查找并处理所有带有构造型的 Bean
    fn find_and_process(&self, container: &Container) -> ComponentResult<()> {
        let stereotypes = fetch_stereotypes(container, &self.stereotype_name())?;
        debug!(
            "处理构造型 {}: {} 个 Bean",
            self.stereotype_name(),
            stereotypes.len()
        );
        for stereotype in &stereotypes {
            self.process(stereotype, container)?;
        }
        Ok(())
    }
}

/// 后置处理器
///
/// 在所有 Bean 注册完成后对容器整体执行一次
pub trait PostBeanProcessor: Send + Sync {
    /// 处理容器
    fn process(&self, container: &Container) -> ComponentResult<()>;
}

/// 运行所有后置处理器的构造型处理器
#[derive(Debug, Default)]
pub struct PostBeanProcessorRunner;

impl Injectable for PostBeanProcessorRunner {
    fn type_metadata() -> TypeMetadata {
        TypeMetadata::class::<Self>()
            .implements::<dyn StereotypeProcessor, Self, _>(|runner| runner)
            .with_constructor(Vec::new(), |_| Ok(Bean::object(PostBeanProcessorRunner)))
    }
}

impl StereotypeProcessor for PostBeanProcessorRunner {
    fn stereotype_name(&self) -> String {
        stereotypes::post_bean_processor().to_string()
    }

    fn process(&self, stereotype: &Stereotype, container: &Container) -> ComponentResult<()> {
        debug!("执行后置处理器: {}", stereotype.id);
        stereotype
            .require::<dyn PostBeanProcessor>()?
            .process(container)
    }
}
