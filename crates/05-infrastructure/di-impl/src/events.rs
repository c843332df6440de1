//! 事件派发器

use di_abstractions::{BeanEvent, EventNotifier};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

type Listener = Arc<dyn Fn(&mut dyn BeanEvent) + Send + Sync>;

/// 事件派发器
///
/// 按具体事件类型登记监听器，派发时按登记顺序调用，
/// 监听器停止传播后不再调用后续监听器
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<TypeId, Vec<Listener>>>,
}

impl EventDispatcher {
    /// 创建派发器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记事件 `E` 的监听器
    pub fn register_listener<E, F>(&self, listener: F)
    where
        E: BeanEvent,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let wrapped: Listener = Arc::new(move |event: &mut dyn BeanEvent| {
            if let Some(event) = event.as_any_mut().downcast_mut::<E>() {
                listener(&mut *event);
            }
        });
        self.listeners
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// 事件 `E` 的监听器数量
    pub fn listener_count<E: BeanEvent>(&self) -> usize {
        self.listeners
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl EventNotifier for EventDispatcher {
    fn dispatch(&self, event: &mut dyn BeanEvent) {
        let type_id = event.as_any().type_id();
        // 监听器可能再次访问容器，调用前先释放锁
        let listeners = self
            .listeners
            .read()
            .get(&type_id)
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            if event.is_propagation_stopped() {
                break;
            }
            listener(&mut *event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("event_types", &self.listeners.read().len())
            .finish()
    }
}
