//! Bean 生命周期事件

use chrono::{DateTime, Utc};
use infrastructure_common::{Bean, TypeMetadata};
use std::any::Any;
use std::sync::Arc;

/// Bean 事件 trait
pub trait BeanEvent: Any + Send + Sync {
    /// 事件对应的 Bean 标识
    fn id(&self) -> &str;

    /// 是否已停止传播
    fn is_propagation_stopped(&self) -> bool;

    /// 停止向后续监听器传播
    fn stop_propagation(&mut self);

    /// 转换为 Any
    fn as_any(&self) -> &dyn Any;

    /// 转换为可变 Any
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 事件通知器 trait
pub trait EventNotifier: Send + Sync {
    /// 派发事件
    fn dispatch(&self, event: &mut dyn BeanEvent);
}

/// 实例创建前事件
#[derive(Debug, Clone)]
pub struct BeforeInstanceBeanEvent {
    /// Bean 标识
    pub id: String,
    /// 类型元数据，工厂创建的 Bean 没有
    pub metadata: Option<Arc<TypeMetadata>>,
    /// 创建方式
    pub strategy: &'static str,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
    stopped: bool,
}

impl BeforeInstanceBeanEvent {
    /// 创建事件
    pub fn new(
        id: impl Into<String>,
        metadata: Option<Arc<TypeMetadata>>,
        strategy: &'static str,
    ) -> Self {
        Self {
            id: id.into(),
            metadata,
            strategy,
            timestamp: Utc::now(),
            stopped: false,
        }
    }
}

/// 实例创建后事件
#[derive(Debug, Clone)]
pub struct AfterInstanceBeanEvent {
    /// Bean 标识
    pub id: String,
    /// 创建的实例
    pub bean: Bean,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
    stopped: bool,
}

impl AfterInstanceBeanEvent {
    /// 创建事件
    pub fn new(id: impl Into<String>, bean: Bean) -> Self {
        Self {
            id: id.into(),
            bean,
            timestamp: Utc::now(),
            stopped: false,
        }
    }
}

macro_rules! impl_bean_event {
    ($event:ty) => {
        impl BeanEvent for $event {
            fn id(&self) -> &str {
                &self.id
            }

            fn is_propagation_stopped(&self) -> bool {
                self.stopped
            }

            fn stop_propagation(&mut self) {
                self.stopped = true;
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

impl_bean_event!(BeforeInstanceBeanEvent);
impl_bean_event!(AfterInstanceBeanEvent);
