//! 约定规范定义
//!
//! 内置标记名称、配置缓存键和命名约定

use crate::component::BeanEntry;
use crate::metadata::TypeMetadata;

/// 组件标记
pub const COMPONENT: &str = "Component";

/// 配置类标记，其工厂方法会被注册为 Bean
pub const CONFIGURATION: &str = "Configuration";

/// 工厂方法标记，属性 `name`
pub const BEAN: &str = "Bean";

/// 配置值注入标记，属性 `bean_id`
pub const VALUE: &str = "Value";

/// 自动装配标记，属性 `bean_id`
pub const AUTOWIRED: &str = "Autowired";

/// 导入配置类标记，属性 `configurations`
pub const IMPORTS: &str = "Imports";

/// 注解中的别名属性
pub const NAME_ATTRIBUTE: &str = "name";

/// 注解中的依赖标识属性
pub const BEAN_ID_ATTRIBUTE: &str = "bean_id";

/// 注解中的导入列表属性
pub const CONFIGURATIONS_ATTRIBUTE: &str = "configurations";

/// 命名约定
#[derive(Debug)]
pub struct NamingConventions;

impl NamingConventions {
    /// 推断条目的 Bean 名称
    ///
    /// 类型取自身名称，工厂方法取所属类型名称，其他条目无法推断
    pub fn guess_bean_name(entry: &BeanEntry) -> Option<String> {
        match entry {
            BeanEntry::Type(metadata) | BeanEntry::Interface(metadata) => {
                Some(metadata.name.clone())
            }
            BeanEntry::FactoryMethod(method) => Some(method.owner.clone()),
            BeanEntry::Instance(_) | BeanEntry::AdHoc(_) => None,
        }
    }

    /// 组件别名，取标记注解的 `name` 属性
    pub fn component_alias(metadata: &TypeMetadata, marker: &str) -> Option<String> {
        metadata
            .get_annotation(marker)
            .and_then(|a| a.string_attribute(NAME_ATTRIBUTE))
            .map(str::to_string)
    }

    /// 外部缓存中的键
    pub fn cache_key(prefix: &str, id: &str) -> String {
        format!("{prefix}{id}")
    }

    /// 类型名称是否位于命名空间下
    ///
    /// 命名空间是模块路径前缀，空命名空间匹配所有类型
    pub fn in_namespace(type_name: &str, namespace: &str) -> bool {
        let namespace = namespace.trim_end_matches("::");
        namespace.is_empty()
            || type_name == namespace
            || type_name
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with("::"))
    }

    /// 去掉模块路径的简短名称
    pub fn short_name(type_name: &str) -> &str {
        type_name.rsplit("::").next().unwrap_or(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Annotation, MethodMetadata, TypeMetadata};
    use std::sync::Arc;

    #[test]
    fn test_guess_bean_name() {
        let metadata = Arc::new(TypeMetadata::class::<String>());
        let method = Arc::new(MethodMetadata::new("app::Config", "make"));

        assert_eq!(
            NamingConventions::guess_bean_name(&BeanEntry::Type(metadata)).as_deref(),
            Some(std::any::type_name::<String>())
        );
        assert_eq!(
            NamingConventions::guess_bean_name(&BeanEntry::FactoryMethod(method)).as_deref(),
            Some("app::Config")
        );
    }

    #[test]
    fn test_component_alias() {
        let named = TypeMetadata::class::<String>()
            .with_annotation(Annotation::new(COMPONENT).with_attribute(NAME_ATTRIBUTE, "text"));
        let unnamed = TypeMetadata::class::<String>()
            .with_annotation(Annotation::new(COMPONENT).with_attribute(NAME_ATTRIBUTE, ""));

        assert_eq!(
            NamingConventions::component_alias(&named, COMPONENT).as_deref(),
            Some("text")
        );
        assert!(NamingConventions::component_alias(&unnamed, COMPONENT).is_none());
        assert!(NamingConventions::component_alias(&named, CONFIGURATION).is_none());
    }

    #[test]
    fn test_namespaces() {
        assert!(NamingConventions::in_namespace("app::services::Foo", "app::services"));
        assert!(NamingConventions::in_namespace("app::services::Foo", "app::"));
        assert!(NamingConventions::in_namespace("app::services::Foo", ""));
        assert!(!NamingConventions::in_namespace("application::Foo", "app"));
        assert_eq!(NamingConventions::short_name("app::services::Foo"), "Foo");
    }
}
