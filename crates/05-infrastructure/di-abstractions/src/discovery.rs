//! 元数据来源抽象接口

use infrastructure_common::TypeMetadata;
use std::sync::Arc;

/// 元数据来源 trait
///
/// 提供类型元数据，以及判断元数据是否仍与来源一致的新鲜度检查
pub trait MetadataSource: Send + Sync {
    /// 获取类型元数据
    fn get_metadata_for_type(&self, name: &str) -> Option<Arc<TypeMetadata>>;

    /// 元数据是否新鲜
    fn is_fresh(&self, name: &str) -> bool;
}

/// 总是新鲜的元数据来源，不提供任何元数据
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFresh;

impl MetadataSource for AlwaysFresh {
    fn get_metadata_for_type(&self, _name: &str) -> Option<Arc<TypeMetadata>> {
        None
    }

    fn is_fresh(&self, _name: &str) -> bool {
        true
    }
}
