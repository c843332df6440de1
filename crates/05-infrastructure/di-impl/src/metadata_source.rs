//! 基于指纹账本的元数据来源

use di_abstractions::MetadataSource;
use infrastructure_common::{
    global_component_manifest, ComponentError, ComponentResult, TypeMetadata,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 清单元数据来源
///
/// 新鲜度通过比较当前元数据指纹与账本中记录的指纹判断，账本以 JSON 文件保存。
/// 清单之外的类型（显式组件、生成的接口实现）通过 [`ManifestMetadataSource::register`] 加入。
pub struct ManifestMetadataSource {
    catalog: RwLock<HashMap<String, Arc<TypeMetadata>>>,
    ledger: RwLock<BTreeMap<String, String>>,
    ledger_path: Option<PathBuf>,
}

impl ManifestMetadataSource {
    /// 以指定类型创建
    pub fn new(metadata: impl IntoIterator<Item = Arc<TypeMetadata>>) -> Self {
        Self {
            catalog: RwLock::new(
                metadata
                    .into_iter()
                    .map(|m| (m.name.clone(), m))
                    .collect(),
            ),
            ledger: RwLock::new(BTreeMap::new()),
            ledger_path: None,
        }
    }

    /// 以全局组件清单创建
    pub fn from_global_manifest() -> Self {
        Self::new(
            global_component_manifest()
                .into_iter()
                .map(|entry| Arc::new((entry.metadata)())),
        )
    }

    /// 关联账本文件，文件存在时加载已记录的指纹
    pub fn with_ledger(mut self, path: impl AsRef<Path>) -> ComponentResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ComponentError::discovery_error(format!(
                    "读取指纹账本失败: {}, 原因: {}",
                    path.display(),
                    e
                ))
            })?;
            let ledger: BTreeMap<String, String> =
                serde_json::from_str(&content).map_err(|e| {
                    ComponentError::discovery_error(format!(
                        "解析指纹账本失败: {}, 原因: {}",
                        path.display(),
                        e
                    ))
                })?;
            debug!("加载指纹账本: {} ({} 条)", path.display(), ledger.len());
            *self.ledger.write() = ledger;
        }
        self.ledger_path = Some(path);
        Ok(self)
    }

    /// 加入或替换类型，不改变账本
    pub fn register(&self, metadata: Arc<TypeMetadata>) {
        self.catalog.write().insert(metadata.name.clone(), metadata);
    }

    /// 账本文件路径
    pub fn ledger_path(&self) -> Option<&Path> {
        self.ledger_path.as_deref()
    }

    /// 记录类型当前的指纹
    pub fn record(&self, name: &str) -> bool {
        match self.catalog.read().get(name) {
            Some(metadata) => {
                self.ledger
                    .write()
                    .insert(name.to_string(), metadata.fingerprint());
                true
            }
            None => false,
        }
    }

    /// 记录所有类型当前的指纹
    pub fn record_all(&self) {
        let mut ledger = self.ledger.write();
        for (name, metadata) in self.catalog.read().iter() {
            ledger.insert(name.clone(), metadata.fingerprint());
        }
    }

    /// 保存账本
    pub fn save(&self) -> ComponentResult<()> {
        let ledger = self.ledger.read().clone();
        self.write_ledger(&ledger)
    }

    /// 以所有类型当前的指纹保存账本
    ///
    /// 内存中的账本不变，本次运行的新鲜度判断仍以加载时的指纹为准
    pub fn save_current(&self) -> ComponentResult<()> {
        let mut snapshot = self.ledger.read().clone();
        for (name, metadata) in self.catalog.read().iter() {
            snapshot.insert(name.clone(), metadata.fingerprint());
        }
        self.write_ledger(&snapshot)
    }

    fn write_ledger(&self, ledger: &BTreeMap<String, String>) -> ComponentResult<()> {
        let Some(path) = &self.ledger_path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(ledger).map_err(|e| {
            ComponentError::discovery_error(format!("序列化指纹账本失败: {e}"))
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ComponentError::discovery_error(format!(
                    "创建账本目录失败: {}, 原因: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            ComponentError::discovery_error(format!(
                "写入指纹账本失败: {}, 原因: {}",
                path.display(),
                e
            ))
        })?;
        info!("保存指纹账本: {} ({} 条)", path.display(), ledger.len());
        Ok(())
    }
}

impl MetadataSource for ManifestMetadataSource {
    fn get_metadata_for_type(&self, name: &str) -> Option<Arc<TypeMetadata>> {
        self.catalog.read().get(name).cloned()
    }

    fn is_fresh(&self, name: &str) -> bool {
        let Some(metadata) = self.catalog.read().get(name).cloned() else {
            return false;
        };
        self.ledger
            .read()
            .get(name)
            .is_some_and(|recorded| *recorded == metadata.fingerprint())
    }
}
