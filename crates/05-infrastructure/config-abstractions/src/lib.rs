//! # Configuration Abstractions
//!
//! 配置源抽象层，定义容器启动前加载配置值所用的接口。
//!
//! ## 核心接口
//!
//! - [`ConfigProvider`] - 配置提供者接口

pub mod provider;

pub use provider::*;
