//! 外部缓存抽象接口

use infrastructure_common::{Bean, CacheResult};

/// Bean 缓存 trait
///
/// 用于跨容器实例保存已创建的 Bean，所有失败都由容器记录后忽略
pub trait BeanCache: Send + Sync {
    /// 是否存在缓存项
    fn has(&self, key: &str) -> CacheResult<bool>;

    /// 获取缓存项
    fn get(&self, key: &str) -> CacheResult<Option<Bean>>;

    /// 写入缓存项
    fn set(&self, key: &str, bean: &Bean) -> CacheResult<()>;

    /// 删除缓存项
    fn delete(&self, key: &str) -> CacheResult<()>;
}
