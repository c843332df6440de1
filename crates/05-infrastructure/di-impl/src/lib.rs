//! # 依赖注入具体实现
//!
//! 提供容器、依赖解析器、事件派发器、缓存适配器以及基于清单的扫描器和元数据来源

pub mod cache;
pub mod container;
pub mod events;
pub mod metadata_source;
pub mod resolver;
pub mod scanner;

pub use cache::{MemoryBeanCache, NullBeanCache};
pub use container::Container;
pub use events::EventDispatcher;
pub use metadata_source::ManifestMetadataSource;
pub use resolver::DependencyResolver;
pub use scanner::ManifestComponentScanner;
