//! # Configuration Implementation
//!
//! 配置源的具体实现以及将配置值注册到容器的加载器。
//!
//! ## 主要组件
//!
//! - [`ConfigLoader`] - 按优先级合并配置并注册到容器
//! - [`TomlConfigProvider`] - TOML 配置提供者
//! - [`YamlConfigProvider`] - YAML 配置提供者
//! - [`JsonConfigProvider`] - JSON 配置提供者
//! - [`EnvironmentConfigProvider`] - 环境变量配置提供者

pub mod loader;
pub mod providers;

pub use loader::*;
pub use providers::*;
