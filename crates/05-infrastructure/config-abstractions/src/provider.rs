//! 配置提供者抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigError;
use serde_json::Value;

/// 配置提供者 trait
///
/// 定义从不同数据源获取配置的统一接口，键使用点号分隔的路径
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// 获取完整的配置树
    async fn get_root(&self) -> Result<Value, ConfigError>;

    /// 获取配置值
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        let root = self.get_root().await?;
        lookup(&root, key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// 检查配置键是否存在
    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        let root = self.get_root().await?;
        Ok(lookup(&root, key).is_some())
    }

    /// 重新加载配置
    async fn reload(&mut self) -> Result<(), ConfigError>;

    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 获取提供者优先级，数值大的覆盖数值小的
    fn priority(&self) -> i32 {
        0
    }
}

/// 按点号路径查找嵌套值
pub fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return None;
    }
    key.split('.')
        .try_fold(root, |current, part| current.as_object()?.get(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticProvider(Value);

    #[async_trait]
    impl ConfigProvider for StaticProvider {
        async fn get_root(&self) -> Result<Value, ConfigError> {
            Ok(self.0.clone())
        }

        async fn reload(&mut self) -> Result<(), ConfigError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "StaticProvider"
        }
    }

    #[test]
    fn test_lookup_nested_path() {
        let root = json!({ "db": { "pool": { "size": 5 } } });
        assert_eq!(lookup(&root, "db.pool.size"), Some(&json!(5)));
        assert_eq!(lookup(&root, "db.missing"), None);
        assert_eq!(lookup(&root, ""), None);
    }

    #[tokio::test]
    async fn test_default_key_access() {
        let provider = StaticProvider(json!({ "app": { "name": "beans" } }));
        assert_eq!(
            provider.get_configuration("app.name").await.expect("key"),
            json!("beans")
        );
        assert!(provider.contains_key("app").await.expect("contains"));
        assert!(matches!(
            provider.get_configuration("app.port").await,
            Err(ConfigError::KeyNotFound { .. })
        ));
    }
}
