//! 组件目录
//!
//! 标识到容器条目的映射，由注册流程从外部填充

use crate::scanner::matches_marker;
use infrastructure_common::{BeanEntry, TypeMetadata};
use std::collections::HashMap;
use std::sync::Arc;

/// 组件目录
///
/// 保留标识的首次注册顺序，覆盖注册不改变顺序
#[derive(Debug, Default, Clone)]
pub struct ComponentDirectory {
    entries: HashMap<String, BeanEntry>,
    order: Vec<String>,
}

impl ComponentDirectory {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册条目，返回被覆盖的旧条目
    pub fn insert(&mut self, id: impl Into<String>, entry: BeanEntry) -> Option<BeanEntry> {
        let id = id.into();
        let previous = self.entries.insert(id.clone(), entry);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// 移除条目
    pub fn remove(&mut self, id: &str) -> Option<BeanEntry> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    /// 获取条目
    pub fn get(&self, id: &str) -> Option<&BeanEntry> {
        self.entries.get(id)
    }

    /// 是否存在条目
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 按注册顺序列出标识
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 标识对应的类型元数据（具体类型或接口）
    pub fn metadata(&self, id: &str) -> Option<Arc<TypeMetadata>> {
        self.get(id).and_then(BeanEntry::metadata).cloned()
    }

    /// 同一份元数据注册在多个标识下时，返回类型自身名称作为主标识
    ///
    /// 只有主标识下注册的是同一份元数据时才返回
    pub fn primary_id(&self, id: &str) -> Option<&str> {
        let Some(BeanEntry::Type(metadata)) = self.get(id) else {
            return None;
        };
        if metadata.name == id {
            return None;
        }
        match self.entries.get_key_value(metadata.name.as_str()) {
            Some((primary, BeanEntry::Type(other))) if Arc::ptr_eq(metadata, other) => {
                Some(primary.as_str())
            }
            _ => None,
        }
    }

    /// 与指定标识共享同一实例的所有标识，包括自身
    ///
    /// 只有主标识存在时别名才共享实例，否则只返回自身
    pub fn sharing_ids(&self, id: &str) -> Vec<String> {
        let primary = self.primary_id(id).unwrap_or(id);
        let Some(BeanEntry::Type(metadata)) = self.entries.get(primary) else {
            return vec![id.to_string()];
        };
        if metadata.name != primary {
            return vec![id.to_string()];
        }
        self.order
            .iter()
            .filter(|other| match self.entries.get(other.as_str()) {
                Some(BeanEntry::Type(m)) => Arc::ptr_eq(m, metadata),
                _ => false,
            })
            .cloned()
            .collect()
    }

    /// 带有指定标记的具体类型
    ///
    /// 同一份元数据只返回一次，优先使用主标识
    pub fn by_component(&self, marker: &str) -> Vec<(String, Arc<TypeMetadata>)> {
        let mut found: Vec<(String, Arc<TypeMetadata>)> = Vec::new();
        for id in &self.order {
            let Some(BeanEntry::Type(metadata)) = self.entries.get(id) else {
                continue;
            };
            if !matches_marker(metadata, marker) {
                continue;
            }
            match found.iter_mut().find(|(_, m)| Arc::ptr_eq(m, metadata)) {
                Some(existing) => {
                    if *id == metadata.name {
                        existing.0 = id.clone();
                    }
                }
                None => found.push((id.clone(), metadata.clone())),
            }
        }
        found
    }

    /// 所有接口条目
    pub fn interface_entries(&self) -> Vec<(String, Arc<TypeMetadata>)> {
        self.order
            .iter()
            .filter_map(|id| match self.entries.get(id) {
                Some(BeanEntry::Interface(metadata)) => Some((id.clone(), metadata.clone())),
                _ => None,
            })
            .collect()
    }
}
