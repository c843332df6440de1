//! 基于组件清单的扫描器

use async_trait::async_trait;
use di_abstractions::{matches_marker, ComponentScanner};
use infrastructure_common::{
    global_component_manifest, ComponentResult, NamingConventions, TypeMetadata,
};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// 清单扫描器
///
/// 在声明的组件清单中按标记查找类型，不做运行时反射。
/// 清单由显式列表和 `#[derive(Component)]` 启动时登记的全局清单组成，
/// 全局清单只在第一次扫描时展开，之后每次扫描返回同一份元数据。
pub struct ManifestComponentScanner {
    explicit: Vec<Arc<TypeMetadata>>,
    include_global: bool,
    global: OnceCell<Vec<Arc<TypeMetadata>>>,
}

impl ManifestComponentScanner {
    /// 扫描全局清单
    pub fn new() -> Self {
        Self {
            explicit: Vec::new(),
            include_global: true,
            global: OnceCell::new(),
        }
    }

    /// 只扫描显式列表
    pub fn from_metadata(metadata: impl IntoIterator<Item = Arc<TypeMetadata>>) -> Self {
        Self {
            explicit: metadata.into_iter().collect(),
            include_global: false,
            global: OnceCell::new(),
        }
    }

    /// 追加类型
    pub fn with_metadata(mut self, metadata: impl Into<Arc<TypeMetadata>>) -> Self {
        self.explicit.push(metadata.into());
        self
    }

    /// 清单中的全部类型，显式列表优先
    pub fn catalog(&self) -> Vec<Arc<TypeMetadata>> {
        let mut catalog = self.explicit.clone();
        if self.include_global {
            let global = self.global.get_or_init(|| {
                global_component_manifest()
                    .into_iter()
                    .map(|entry| Arc::new((entry.metadata)()))
                    .collect()
            });
            for metadata in global {
                if catalog.iter().all(|m| m.name != metadata.name) {
                    catalog.push(metadata.clone());
                }
            }
        }
        catalog
    }
}

impl Default for ManifestComponentScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentScanner for ManifestComponentScanner {
    async fn scan_for_marker(
        &self,
        marker: &str,
        namespaces: &[String],
    ) -> ComponentResult<Vec<Arc<TypeMetadata>>> {
        let found: Vec<Arc<TypeMetadata>> = self
            .catalog()
            .into_iter()
            .filter(|metadata| matches_marker(metadata, marker))
            .filter(|metadata| {
                namespaces.is_empty()
                    || namespaces
                        .iter()
                        .any(|ns| NamingConventions::in_namespace(&metadata.name, ns))
            })
            .collect();

        debug!("扫描标记 {}: 发现 {} 个类型", marker, found.len());
        Ok(found)
    }

    fn name(&self) -> &str {
        "ManifestComponentScanner"
    }
}
