//! Bean 值与参数列表
//!
//! Bean 是容器中按标识管理的实例：要么是配置值，要么是类型擦除的对象。

use crate::component::ContainerAware;
use crate::errors::{ContainerError, ContainerResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
enum BeanInner {
    Value(Value),
    Object {
        instance: Arc<dyn Any + Send + Sync>,
        type_name: &'static str,
    },
}

/// 容器管理的实例
///
/// 克隆 Bean 只会增加引用计数，多个克隆指向同一个底层实例。
#[derive(Clone)]
pub struct Bean {
    inner: BeanInner,
    aware: Option<Arc<dyn ContainerAware>>,
}

impl Bean {
    /// 以配置值创建 Bean
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            inner: BeanInner::Value(value.into()),
            aware: None,
        }
    }

    /// 以对象创建 Bean
    pub fn object<T: Any + Send + Sync>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// 以已有的共享对象创建 Bean
    pub fn from_arc<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            inner: BeanInner::Object {
                instance,
                type_name: std::any::type_name::<T>(),
            },
            aware: None,
        }
    }

    /// 以接口视图创建 Bean，可通过 [`Bean::as_interface`] 取回
    pub fn interface<I: ?Sized + Send + Sync + 'static>(instance: Arc<I>) -> Self {
        Self {
            inner: BeanInner::Object {
                instance: Arc::new(instance),
                type_name: std::any::type_name::<I>(),
            },
            aware: None,
        }
    }

    /// 创建需要接收容器的对象 Bean
    pub fn aware<T: ContainerAware + Any>(instance: Arc<T>) -> Self {
        let aware: Arc<dyn ContainerAware> = instance.clone();
        Self::from_arc(instance).with_aware(aware)
    }

    /// 附加接收容器的能力
    pub fn with_aware(mut self, aware: Arc<dyn ContainerAware>) -> Self {
        self.aware = Some(aware);
        self
    }

    /// 获取接收容器的能力
    pub fn container_aware(&self) -> Option<&Arc<dyn ContainerAware>> {
        self.aware.as_ref()
    }

    /// 是否为标量值（字符串、数字、布尔）
    pub fn is_scalar(&self) -> bool {
        matches!(
            &self.inner,
            BeanInner::Value(Value::String(_) | Value::Number(_) | Value::Bool(_))
        )
    }

    /// 是否为对象
    pub fn is_object(&self) -> bool {
        matches!(self.inner, BeanInner::Object { .. })
    }

    /// 获取配置值
    pub fn as_value(&self) -> Option<&Value> {
        match &self.inner {
            BeanInner::Value(value) => Some(value),
            BeanInner::Object { .. } => None,
        }
    }

    /// 将配置值反序列化为指定类型
    pub fn to_value<V: DeserializeOwned>(&self) -> Option<V> {
        self.as_value()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 向下转型为具体类型
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match &self.inner {
            BeanInner::Object { instance, .. } => instance.clone().downcast::<T>().ok(),
            BeanInner::Value(_) => None,
        }
    }

    /// 获取接口视图
    pub fn as_interface<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        match &self.inner {
            BeanInner::Object { instance, .. } => instance.downcast_ref::<Arc<I>>().cloned(),
            BeanInner::Value(_) => None,
        }
    }

    /// 对象的类型名称，配置值返回 `None`
    pub fn type_name(&self) -> Option<&'static str> {
        match &self.inner {
            BeanInner::Object { type_name, .. } => Some(type_name),
            BeanInner::Value(_) => None,
        }
    }

    /// 判断两个 Bean 是否为同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (BeanInner::Object { instance: a, .. }, BeanInner::Object { instance: b, .. }) => {
                std::ptr::eq(
                    Arc::as_ptr(a).cast::<()>(),
                    Arc::as_ptr(b).cast::<()>(),
                )
            }
            (BeanInner::Value(a), BeanInner::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            BeanInner::Value(value) => f.debug_tuple("Bean::Value").field(value).finish(),
            BeanInner::Object { type_name, .. } => f
                .debug_struct("Bean::Object")
                .field("type_name", type_name)
                .field("aware", &self.aware.is_some())
                .finish(),
        }
    }
}

impl From<Value> for Bean {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

/// 构造函数和工厂接收的参数列表
///
/// 位置与参数描述一一对应，被跳过的可选参数为 `None`。
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Option<Bean>>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(values: Vec<Option<Bean>>) -> Self {
        Self { values }
    }

    /// 空参数列表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 获取原始 Bean，跳过的参数返回 `None`
    pub fn get(&self, index: usize) -> Option<&Bean> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// 获取必需的 Bean
    pub fn bean(&self, index: usize) -> ContainerResult<Bean> {
        self.get(index)
            .cloned()
            .ok_or_else(|| ContainerError::argument(index, "参数缺失"))
    }

    /// 获取必需的对象参数
    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> ContainerResult<Arc<T>> {
        self.optional_object(index)?
            .ok_or_else(|| ContainerError::argument(index, "参数缺失"))
    }

    /// 获取可选的对象参数，类型不匹配仍然报错
    pub fn optional_object<T: Any + Send + Sync>(
        &self,
        index: usize,
    ) -> ContainerResult<Option<Arc<T>>> {
        match self.get(index) {
            None => Ok(None),
            Some(bean) => bean.downcast::<T>().map(Some).ok_or_else(|| {
                ContainerError::argument(
                    index,
                    format!("类型不匹配, 期望 {}", std::any::type_name::<T>()),
                )
            }),
        }
    }

    /// 获取必需的接口参数
    pub fn interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> ContainerResult<Arc<I>> {
        self.optional_interface(index)?
            .ok_or_else(|| ContainerError::argument(index, "参数缺失"))
    }

    /// 获取可选的接口参数
    pub fn optional_interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> ContainerResult<Option<Arc<I>>> {
        match self.get(index) {
            None => Ok(None),
            Some(bean) => bean.as_interface::<I>().map(Some).ok_or_else(|| {
                ContainerError::argument(
                    index,
                    format!("不是接口视图, 期望 {}", std::any::type_name::<I>()),
                )
            }),
        }
    }

    /// 获取必需的配置值参数
    pub fn value<V: DeserializeOwned>(&self, index: usize) -> ContainerResult<V> {
        self.optional_value(index)?
            .ok_or_else(|| ContainerError::argument(index, "参数缺失"))
    }

    /// 获取可选的配置值参数
    pub fn optional_value<V: DeserializeOwned>(&self, index: usize) -> ContainerResult<Option<V>> {
        match self.get(index) {
            None => Ok(None),
            Some(bean) => bean.to_value::<V>().map(Some).ok_or_else(|| {
                ContainerError::argument(
                    index,
                    format!("无法转换为 {}", std::any::type_name::<V>()),
                )
            }),
        }
    }
}

impl FromIterator<Option<Bean>> for Arguments {
    fn from_iter<I: IntoIterator<Item = Option<Bean>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Debug)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_scalar_classification() {
        assert!(Bean::value("text").is_scalar());
        assert!(Bean::value(42).is_scalar());
        assert!(Bean::value(true).is_scalar());
        assert!(!Bean::value(Value::Null).is_scalar());
        assert!(!Bean::value(json!({"a": 1})).is_scalar());
        assert!(!Bean::value(json!([1, 2])).is_scalar());
        assert!(!Bean::object(English).is_scalar());
    }

    #[test]
    fn test_clones_share_the_instance() {
        let bean = Bean::object(English);
        let other = bean.clone();

        assert!(bean.ptr_eq(&other));
        assert!(!bean.ptr_eq(&Bean::object(English)));

        let a = bean.downcast::<English>().expect("downcast");
        let b = other.downcast::<English>().expect("downcast");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_interface_view() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let bean = Bean::interface::<dyn Greeter>(greeter);

        let view = bean.as_interface::<dyn Greeter>().expect("interface view");
        assert_eq!(view.greet(), "hello");
        assert!(bean.downcast::<English>().is_none());
    }

    #[test]
    fn test_arguments_accessors() {
        let args: Arguments = vec![
            Some(Bean::object(English)),
            None,
            Some(Bean::value(8080)),
        ]
        .into_iter()
        .collect();

        assert_eq!(args.len(), 3);
        assert!(args.object::<English>(0).is_ok());
        assert!(args.optional_object::<English>(1).expect("optional").is_none());
        assert_eq!(args.value::<u16>(2).expect("value"), 8080);

        let missing = args.object::<English>(1).unwrap_err();
        assert!(matches!(missing, ContainerError::Argument { index: 1, .. }));

        let mismatch = args.object::<String>(0).unwrap_err();
        assert!(matches!(mismatch, ContainerError::Argument { index: 0, .. }));
    }
}
