//! 配置加载器
//!
//! 按优先级合并多个配置提供者，展开为点号分隔的标识后注册到容器

use config_abstractions::ConfigProvider;
use infrastructure_common::{Bean, BeanContainer, BeanEntry, ConfigError};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// 配置加载器
#[derive(Default)]
pub struct ConfigLoader {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigLoader {
    /// 创建空的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配置提供者
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) -> &mut Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// 添加已装箱的配置提供者
    pub fn add_boxed_provider(&mut self, provider: Box<dyn ConfigProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// 配置提供者数量
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// 合并所有提供者的配置树
    ///
    /// 优先级低的先合并，优先级相同时按添加顺序，后合并的覆盖先合并的
    pub async fn load(&self) -> Result<Value, ConfigError> {
        let mut ordered: Vec<&dyn ConfigProvider> =
            self.providers.iter().map(|p| p.as_ref()).collect();
        ordered.sort_by_key(|p| p.priority());

        let mut merged = Value::Object(Map::new());
        for provider in ordered {
            let root = provider.get_root().await?;
            if !root.is_object() {
                return Err(ConfigError::TypeConversionError {
                    message: format!("配置源 {} 的根节点不是对象", provider.name()),
                });
            }
            debug!("合并配置源: {} (优先级 {})", provider.name(), provider.priority());
            merge(&mut merged, root);
        }
        Ok(merged)
    }

    /// 展开后的标识和值，父节点排在子节点之前
    pub async fn entries(&self) -> Result<Vec<(String, Value)>, ConfigError> {
        let merged = self.load().await?;
        let mut entries = Vec::new();
        if let Value::Object(map) = &merged {
            flatten(map, "", &mut entries);
        }
        Ok(entries)
    }

    /// 将配置值作为实例注册到容器，返回注册数量
    pub async fn register(&self, container: &dyn BeanContainer) -> Result<usize, ConfigError> {
        let entries = self.entries().await?;
        let count = entries.len();
        for (id, value) in entries {
            container.set(&id, BeanEntry::Instance(Bean::value(value)));
        }
        info!("注册配置值 {} 个", count);
        Ok(count)
    }
}

/// 深度合并，对象逐键合并，其他值直接覆盖
fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// 每一层嵌套都以完整的结构值登记
fn flatten(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let id = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        out.push((id.clone(), value.clone()));
        if let Value::Object(nested) = value {
            flatten(nested, &id, out);
        }
    }
}
