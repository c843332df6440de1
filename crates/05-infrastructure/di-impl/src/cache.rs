//! 外部缓存适配器

use dashmap::DashMap;
use di_abstractions::BeanCache;
use infrastructure_common::{Bean, CacheResult};

/// 空缓存，不保存任何内容
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBeanCache;

impl BeanCache for NullBeanCache {
    fn has(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    fn get(&self, _key: &str) -> CacheResult<Option<Bean>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _bean: &Bean) -> CacheResult<()> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }
}

/// 进程内缓存
///
/// 可在多个容器之间共享已创建的 Bean
#[derive(Debug, Default)]
pub struct MemoryBeanCache {
    entries: DashMap<String, Bean>,
}

impl MemoryBeanCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 缓存项数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BeanCache for MemoryBeanCache {
    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn get(&self, key: &str) -> CacheResult<Option<Bean>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, bean: &Bean) -> CacheResult<()> {
        self.entries.insert(key.to_string(), bean.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
