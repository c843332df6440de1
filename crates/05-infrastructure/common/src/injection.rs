//! 属性注入槽
//!
//! Bean 创建后以共享引用存在，属性注入通过内部可变的槽完成

use parking_lot::RwLock;
use std::fmt;

/// 属性注入槽
///
/// 用于 `Autowired` 和 `Value` 属性，创建时为空，由后置处理器写入
pub struct InjectionSlot<T> {
    value: RwLock<Option<T>>,
}

impl<T: Clone> InjectionSlot<T> {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// 创建已有值的槽
    pub fn with_value(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// 获取当前值
    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    /// 写入值，覆盖旧值
    pub fn set(&self, value: T) {
        *self.value.write() = Some(value);
    }

    /// 是否已写入
    pub fn is_set(&self) -> bool {
        self.value.read().is_some()
    }
}

impl<T: Clone> Default for InjectionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for InjectionSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InjectionSlot").field(&*self.value.read()).finish()
    }
}
