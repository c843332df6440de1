//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Beans 容器的公共类型。
//!
//! ## 核心组件
//!
//! - [`TypeMetadata`] - 类型元数据模型
//! - [`Bean`] / [`Arguments`] - 容器管理的实例与构造参数
//! - [`BeanEntry`] - 容器条目
//! - [`BeanContainer`] / [`ContainerAware`] - 容器查找接口
//! - [`ConstructionStatus`] - 创建状态
//! - [`InjectionSlot`] - 属性注入槽
//! - 全局组件清单，由 `#[derive(Component)]` 在启动时填充

pub mod bean;
pub mod component;
pub mod conventions;
pub mod errors;
pub mod injection;
pub mod lifecycle;
pub mod metadata;

pub use bean::*;
pub use component::*;
pub use conventions::NamingConventions;
pub use errors::*;
pub use injection::InjectionSlot;
pub use lifecycle::*;
pub use metadata::*;

/// 全局组件清单条目
#[derive(Debug, Clone, Copy)]
pub struct ManifestEntry {
    /// 类型名称
    pub type_name: &'static str,
    /// 元数据工厂
    pub metadata: fn() -> TypeMetadata,
}

/// 全局组件清单
static GLOBAL_COMPONENT_MANIFEST: once_cell::sync::Lazy<parking_lot::RwLock<Vec<ManifestEntry>>> =
    once_cell::sync::Lazy::new(|| parking_lot::RwLock::new(Vec::new()));

/// 向全局组件清单登记类型，同名类型只登记一次
pub fn register_component_metadata(entry: ManifestEntry) {
    let mut manifest = GLOBAL_COMPONENT_MANIFEST.write();
    if manifest.iter().all(|e| e.type_name != entry.type_name) {
        tracing::debug!("登记组件清单: {}", entry.type_name);
        manifest.push(entry);
    }
}

/// 获取全局组件清单
pub fn global_component_manifest() -> Vec<ManifestEntry> {
    GLOBAL_COMPONENT_MANIFEST.read().clone()
}
