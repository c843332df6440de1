//! # 容器组合层
//!
//! 这个 crate 负责把配置源、组件扫描和容器组合成完成注册的容器。
//!
//! ## 主要功能
//!
//! - **容器构建器**: 使用构建者模式组装容器及其协作者
//! - **Bean 注册器**: 按构造型发现组件并注册，处理导入、配置值和工厂方法
//! - **构造型处理器**: 注册完成后对带有构造型的 Bean 执行处理
//! - **接口实现器**: 为接口条目生成方法分发实现
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_composition::ContainerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ContainerBuilder::new()
//!         .add_config_yaml("config/beans.yaml")?
//!         .with_namespaces(["my_app::services"])
//!         .build()
//!         .await?;
//!
//!     let name = container.get("app.name")?;
//!     println!("应用名称: {:?}", name.as_value());
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod implementor;
pub mod post_processors;
pub mod processor;
pub mod registerer;
pub mod stereotypes;

// 重新导出主要类型
pub use builder::{ContainerBuilder, LoggingConfig};
pub use implementor::{
    GeneratedInstance, GeneratedType, ImplementationCache, ImplementationGenerator,
    InterfaceImplementor, MethodBody,
};
pub use post_processors::{AutowirePostBeanProcessor, ValuePostBeanProcessor};
pub use processor::{
    fetch_stereotypes, PostBeanProcessor, PostBeanProcessorRunner, Stereotype, StereotypeProcessor,
};
pub use registerer::{BeanRegisterer, RegistererConfigurator};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
