//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器协作者的接口和组件目录。
//!
//! ## 核心接口
//!
//! - [`ComponentDirectory`] - 组件目录
//! - [`ComponentScanner`] - 组件扫描器接口
//! - [`MetadataSource`] - 元数据来源接口
//! - [`BeanCache`] - 外部缓存接口
//! - [`EventNotifier`] - 事件通知接口
//! - [`DependencySource`] - 依赖来源接口

pub mod cache;
pub mod container;
pub mod discovery;
pub mod events;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use cache::*;
pub use container::*;
pub use discovery::*;
pub use events::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
