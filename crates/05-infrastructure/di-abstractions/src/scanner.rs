//! 组件扫描器抽象接口
//!
//! 按标记在命名空间中发现组件类型

use async_trait::async_trait;
use infrastructure_common::{ComponentResult, TypeMetadata};
use std::sync::Arc;

/// 组件扫描器 trait
///
/// 用于自动发现带有指定标记的类型
#[async_trait]
pub trait ComponentScanner: Send + Sync {
    /// 扫描命名空间中带有指定标记的类型
    ///
    /// 标记可以是注解名称，也可以是祖先类型或接口名称；
    /// 命名空间为空时扫描全部类型
    async fn scan_for_marker(
        &self,
        marker: &str,
        namespaces: &[String],
    ) -> ComponentResult<Vec<Arc<TypeMetadata>>>;

    /// 获取扫描器名称
    fn name(&self) -> &str;
}

/// 类型是否带有标记
pub fn matches_marker(metadata: &TypeMetadata, marker: &str) -> bool {
    metadata.has_annotation(marker) || metadata.is_instance_of(marker)
}
