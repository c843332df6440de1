//! 配置提供者实现

use async_trait::async_trait;
use config_abstractions::ConfigProvider;
use infrastructure_common::ConfigError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 读取配置文件内容
fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// 空文件视为空配置
fn empty_as_object(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// TOML 配置提供者
#[derive(Debug)]
pub struct TomlConfigProvider {
    file_path: PathBuf,
    config: Value,
    priority: i32,
}

impl TomlConfigProvider {
    /// 创建新的 TOML 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut provider = Self {
            file_path: path.as_ref().to_path_buf(),
            config: Value::Null,
            priority: 100, // TOML 文件默认高优先级
        };

        // 初始加载
        provider.load_config()?;
        Ok(provider)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// 加载配置文件
    fn load_config(&mut self) -> Result<(), ConfigError> {
        debug!("加载 TOML 配置文件: {}", self.file_path.display());

        let content = read_file(&self.file_path)?;
        let table: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        self.config = toml_to_json(&table);

        debug!("TOML 配置文件加载完成");
        Ok(())
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

#[async_trait]
impl ConfigProvider for TomlConfigProvider {
    async fn get_root(&self) -> Result<Value, ConfigError> {
        Ok(self.config.clone())
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_config()
    }

    fn name(&self) -> &str {
        "TomlConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// YAML 配置提供者
#[derive(Debug)]
pub struct YamlConfigProvider {
    file_path: PathBuf,
    config: Value,
    priority: i32,
}

impl YamlConfigProvider {
    /// 创建新的 YAML 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut provider = Self {
            file_path: path.as_ref().to_path_buf(),
            config: Value::Null,
            priority: 80,
        };

        provider.load_config()?;
        Ok(provider)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_config(&mut self) -> Result<(), ConfigError> {
        debug!("加载 YAML 配置文件: {}", self.file_path.display());

        let content = read_file(&self.file_path)?;
        let value: Value = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        self.config = empty_as_object(value);

        debug!("YAML 配置文件加载完成");
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for YamlConfigProvider {
    async fn get_root(&self) -> Result<Value, ConfigError> {
        Ok(self.config.clone())
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_config()
    }

    fn name(&self) -> &str {
        "YamlConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// JSON 配置提供者
#[derive(Debug)]
pub struct JsonConfigProvider {
    file_path: PathBuf,
    config: Value,
    priority: i32,
}

impl JsonConfigProvider {
    /// 创建新的 JSON 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut provider = Self {
            file_path: path.as_ref().to_path_buf(),
            config: Value::Null,
            priority: 90, // JSON 文件中等优先级
        };

        provider.load_config()?;
        Ok(provider)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_config(&mut self) -> Result<(), ConfigError> {
        debug!("加载 JSON 配置文件: {}", self.file_path.display());

        let content = read_file(&self.file_path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        self.config = empty_as_object(value);

        debug!("JSON 配置文件加载完成");
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for JsonConfigProvider {
    async fn get_root(&self) -> Result<Value, ConfigError> {
        Ok(self.config.clone())
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_config()
    }

    fn name(&self) -> &str {
        "JsonConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量配置提供者
///
/// `APP_DB_HOST=localhost` 在前缀为 `APP` 时映射为 `db.host`
#[derive(Debug)]
pub struct EnvironmentConfigProvider {
    prefix: String,
    separator: String,
    priority: i32,
    env_vars: BTreeMap<String, String>,
}

impl EnvironmentConfigProvider {
    /// 创建新的环境变量配置提供者
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// 使用给定的变量集合创建
    pub fn from_vars(
        prefix: impl Into<String>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut provider = Self {
            prefix: prefix.into(),
            separator: "_".to_string(),
            priority: 200, // 环境变量最高优先级
            env_vars: BTreeMap::new(),
        };
        provider.load_env_vars(vars);
        provider
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 环境变量前缀
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 加载带前缀的环境变量
    fn load_env_vars(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        debug!("加载环境变量，前缀: {}", self.prefix);

        self.env_vars = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(&self.prefix))
            .collect();

        debug!("加载了 {} 个环境变量", self.env_vars.len());
    }

    /// 将环境变量键转换为配置键，不匹配前缀时返回 `None`
    fn env_key_to_config_key(&self, env_key: &str) -> Option<String> {
        let rest = env_key.strip_prefix(&self.prefix)?;
        let key = rest.strip_prefix(self.separator.as_str())?;
        if key.is_empty() {
            return None;
        }

        // 将分隔符转换为点分隔符，并转换为小写
        Some(key.replace(&self.separator, ".").to_lowercase())
    }
}

/// 尝试解析为不同类型
fn parse_env_value(value: &str) -> Value {
    if let Ok(bool_val) = value.parse::<bool>() {
        Value::Bool(bool_val)
    } else if let Ok(int_val) = value.parse::<i64>() {
        Value::Number(serde_json::Number::from(int_val))
    } else if let Some(number) = value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        Value::Number(number)
    } else {
        Value::String(value.to_string())
    }
}

/// 将点号路径写入嵌套对象
fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    let mut parts = key.split('.').peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            // 已存在的嵌套节点保留
            if !current.get(part).is_some_and(Value::is_object) {
                current.insert(part.to_string(), value);
            }
            return;
        }
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
}

#[async_trait]
impl ConfigProvider for EnvironmentConfigProvider {
    async fn get_root(&self) -> Result<Value, ConfigError> {
        let mut root = Map::new();
        for (env_key, value) in &self.env_vars {
            if let Some(key) = self.env_key_to_config_key(env_key) {
                insert_path(&mut root, &key, parse_env_value(value));
            }
        }
        Ok(Value::Object(root))
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_env_vars(std::env::vars());
        Ok(())
    }

    fn name(&self) -> &str {
        "EnvironmentConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[tokio::test]
    async fn test_toml_provider_reads_nested_tables() {
        let file = write_temp(".toml", "[db]\nhost = \"localhost\"\nport = 5432\n");
        let provider = TomlConfigProvider::new(file.path()).expect("toml");

        assert_eq!(
            provider.get_configuration("db.port").await.expect("port"),
            json!(5432)
        );
        assert_eq!(provider.priority(), 100);
    }

    #[tokio::test]
    async fn test_yaml_provider_reads_sequences() {
        let file = write_temp(".yaml", "app:\n  name: beans\n  tags: [a, b]\n");
        let provider = YamlConfigProvider::new(file.path()).expect("yaml");

        assert_eq!(
            provider.get_configuration("app.tags").await.expect("tags"),
            json!(["a", "b"])
        );
    }

    #[tokio::test]
    async fn test_json_provider_reload_picks_up_changes() {
        let file = write_temp(".json", r#"{"feature": {"enabled": false}}"#);
        let mut provider = JsonConfigProvider::new(file.path()).expect("json");
        assert_eq!(
            provider.get_configuration("feature.enabled").await.expect("flag"),
            json!(false)
        );

        std::fs::write(file.path(), r#"{"feature": {"enabled": true}}"#).expect("rewrite");
        provider.reload().await.expect("reload");
        assert_eq!(
            provider.get_configuration("feature.enabled").await.expect("flag"),
            json!(true)
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = YamlConfigProvider::new("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_content_is_parse_error() {
        let file = write_temp(".json", "{ not json");
        let result = JsonConfigProvider::new(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_environment_provider_maps_prefixed_vars() {
        let provider = EnvironmentConfigProvider::from_vars(
            "BEANS",
            vec![
                ("BEANS_DB_HOST".to_string(), "db.internal".to_string()),
                ("BEANS_DB_PORT".to_string(), "6543".to_string()),
                ("BEANS_DEBUG".to_string(), "true".to_string()),
                ("BEANSX_IGNORED".to_string(), "1".to_string()),
                ("OTHER_DB_HOST".to_string(), "elsewhere".to_string()),
            ],
        );

        let root = provider.get_root().await.expect("root");
        assert_eq!(
            root,
            json!({ "db": { "host": "db.internal", "port": 6543 }, "debug": true })
        );
    }

    #[tokio::test]
    async fn test_environment_provider_custom_separator() {
        let provider = EnvironmentConfigProvider::from_vars(
            "APP",
            vec![("APP__POOL_SIZE__MAX".to_string(), "8".to_string())],
        )
        .with_separator("__");

        assert_eq!(
            provider.get_configuration("pool_size.max").await.expect("max"),
            json!(8)
        );
    }
}
