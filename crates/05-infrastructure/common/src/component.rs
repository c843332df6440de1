//! 容器条目与容器接口定义

use crate::bean::{Arguments, Bean};
use crate::errors::{BoxError, ContainerError, ContainerResult};
use crate::metadata::{MethodMetadata, ParamMetadata, TypeMetadata};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// 临时工厂函数
pub type FactoryFn = Arc<dyn Fn(Arguments) -> Result<Bean, BoxError> + Send + Sync>;

/// 临时工厂：带有自身参数列表的可调用对象
#[derive(Clone)]
pub struct AdHocFactory {
    /// 参数列表
    pub params: Vec<ParamMetadata>,
    /// 工厂函数
    pub factory: FactoryFn,
}

impl AdHocFactory {
    /// 创建无参数的临时工厂
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Arguments) -> Result<Bean, BoxError> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            factory: Arc::new(factory),
        }
    }

    /// 添加参数
    pub fn with_param(mut self, param: ParamMetadata) -> Self {
        self.params.push(param);
        self
    }

    /// 调用工厂
    pub fn call(&self, args: Arguments) -> Result<Bean, BoxError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for AdHocFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdHocFactory")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// 容器条目
///
/// 每个标识只对应一种条目
#[derive(Debug, Clone)]
pub enum BeanEntry {
    /// 已创建的实例
    Instance(Bean),
    /// 通过构造函数创建的具体类型
    Type(Arc<TypeMetadata>),
    /// 另一个 Bean 上的工厂方法
    FactoryMethod(Arc<MethodMetadata>),
    /// 临时工厂
    AdHoc(AdHocFactory),
    /// 接口，只能作为实现的绑定目标
    Interface(Arc<TypeMetadata>),
}

impl BeanEntry {
    /// 按元数据种类生成条目
    pub fn from_metadata(metadata: Arc<TypeMetadata>) -> Self {
        if metadata.is_interface() {
            Self::Interface(metadata)
        } else {
            Self::Type(metadata)
        }
    }

    /// 条目种类名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Type(_) => "type",
            Self::FactoryMethod(_) => "factory_method",
            Self::AdHoc(_) => "ad_hoc",
            Self::Interface(_) => "interface",
        }
    }

    /// 条目携带的类型元数据
    pub fn metadata(&self) -> Option<&Arc<TypeMetadata>> {
        match self {
            Self::Type(metadata) | Self::Interface(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// 构建该条目需要解析的参数
    pub fn params(&self) -> &[ParamMetadata] {
        match self {
            Self::Type(metadata) => metadata.get_constructor_params(),
            Self::FactoryMethod(method) => &method.params,
            Self::AdHoc(factory) => &factory.params,
            Self::Instance(_) | Self::Interface(_) => &[],
        }
    }
}

impl From<Bean> for BeanEntry {
    fn from(bean: Bean) -> Self {
        Self::Instance(bean)
    }
}

impl From<Arc<TypeMetadata>> for BeanEntry {
    fn from(metadata: Arc<TypeMetadata>) -> Self {
        Self::from_metadata(metadata)
    }
}

impl From<TypeMetadata> for BeanEntry {
    fn from(metadata: TypeMetadata) -> Self {
        Self::from_metadata(Arc::new(metadata))
    }
}

impl From<MethodMetadata> for BeanEntry {
    fn from(method: MethodMetadata) -> Self {
        Self::FactoryMethod(Arc::new(method))
    }
}

impl From<AdHocFactory> for BeanEntry {
    fn from(factory: AdHocFactory) -> Self {
        Self::AdHoc(factory)
    }
}

/// 容器查找接口
///
/// 对象安全，可以以 `Arc<dyn BeanContainer>` 形式传递给接收容器的 Bean
pub trait BeanContainer: Send + Sync {
    /// 标识是否可解析
    fn has(&self, id: &str) -> bool;

    /// 获取 Bean，必要时创建
    fn get(&self, id: &str) -> ContainerResult<Bean>;

    /// 注册条目，覆盖已有条目
    fn set(&self, id: &str, entry: BeanEntry);

    /// 所有已注册的标识
    fn ids(&self) -> Vec<String>;

    /// 获取标识对应的类型元数据
    fn get_metadata(&self, id: &str) -> Option<Arc<TypeMetadata>>;

    /// 获取带有指定标记的所有类型元数据
    fn get_metadata_by_component(&self, marker: &str) -> Vec<Arc<TypeMetadata>>;

    /// 获取带有指定标记的所有 Bean
    fn get_beans_by_component(&self, marker: &str) -> ContainerResult<Vec<Bean>>;
}

impl dyn BeanContainer {
    /// 获取并向下转型为具体类型
    pub fn get_object<T: Any + Send + Sync>(&self, id: &str) -> ContainerResult<Arc<T>> {
        let bean = self.get(id)?;
        bean.downcast::<T>().ok_or_else(|| {
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
    pub fn resolve_interface<I: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> ContainerResult<Arc<I>> {
        let id = std::any::type_name::<I>();
        self.get(id)?
            .as_interface::<I>()
            .ok_or_else(|| ContainerError::invalid_entry(id, "不是接口视图"))
    }
}

/// 接收容器的能力
///
/// 实例创建完成后，容器会把自身的弱引用注入进来
pub trait ContainerAware: Send + Sync {
    /// 注入容器
    fn set_container(&self, container: Weak<dyn BeanContainer>);
}
