//! 内置构造型标记
//!
//! 注解类构造型使用字符串标记，能力类构造型以 trait 对象的类型名称作为标记，
//! 类型通过声明实现该 trait 被发现

use crate::implementor::InterfaceImplementor;
use crate::processor::{PostBeanProcessor, StereotypeProcessor};
use crate::registerer::RegistererConfigurator;
use infrastructure_common::conventions;

/// 后置处理器标记
pub fn post_bean_processor() -> &'static str {
    std::any::type_name::<dyn PostBeanProcessor>()
}

/// 构造型处理器标记
pub fn stereotype_processor() -> &'static str {
    std::any::type_name::<dyn StereotypeProcessor>()
}

/// 接口实现器标记
pub fn interface_implementor() -> &'static str {
    std::any::type_name::<dyn InterfaceImplementor>()
}

/// 注册配置器标记
pub fn registerer_configurator() -> &'static str {
    std::any::type_name::<dyn RegistererConfigurator>()
}

/// 注册器默认处理的构造型，按处理顺序排列
pub fn default_stereotypes() -> Vec<String> {
    vec![
        conventions::COMPONENT.to_string(),
        conventions::CONFIGURATION.to_string(),
        post_bean_processor().to_string(),
        stereotype_processor().to_string(),
        interface_implementor().to_string(),
    ]
}
