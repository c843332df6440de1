//! 容器配置

/// 默认的外部缓存键前缀
pub const DEFAULT_CACHE_PREFIX: &str = "container.bean.";

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// 调试模式下，外部缓存命中需要通过元数据新鲜度检查
    pub debug: bool,
    /// 外部缓存键前缀
    pub cache_prefix: String,
}

impl ContainerConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self {
            debug: false,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }

    /// 设置调试模式
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 设置缓存键前缀
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}
