//! 宿主对象的记忆槽位表
//!
//! 以槽位名为键，保存 [`MemorySlot`]。克隆得到的句柄共享同一份数据，
//! 因此内置记忆工具和宿主对象的字段访问器看到的是同一张表。

use crate::error::Result;
use crate::memory::slot::MemorySlot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// `get_memories_overview` 输出的单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryOverview {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub hint: Option<String>,
    pub size_kb: Option<f64>,
    pub description: String,
    pub preview: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<RwLock<BTreeMap<String, MemorySlot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, MemorySlot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, MemorySlot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<MemorySlot> {
        self.read().get(name).cloned()
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.read().get(name).map(|slot| slot.value.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// 取出槽位；不存在时用 `init` 创建并写入
    pub fn get_or_create<F>(&self, name: &str, init: F) -> Result<MemorySlot>
    where
        F: FnOnce() -> Result<MemorySlot>,
    {
        if let Some(slot) = self.get(name) {
            return Ok(slot);
        }
        let mut slots = self.write();
        if let Some(slot) = slots.get(name) {
            return Ok(slot.clone());
        }
        let slot = init()?;
        debug!(memory = %name, "创建记忆槽位");
        slots.insert(name.to_string(), slot.clone());
        Ok(slot)
    }

    /// 更新槽位的值并保留已有元数据；不存在时用 `init` 创建（`init` 得到的是新值）
    pub fn set_value<F>(&self, name: &str, value: Value, init: F)
    where
        F: FnOnce(Value) -> MemorySlot,
    {
        let mut slots = self.write();
        match slots.get_mut(name) {
            Some(slot) => slot.value = value,
            None => {
                debug!(memory = %name, "创建记忆槽位");
                slots.insert(name.to_string(), init(value));
            }
        }
    }

    /// 整体写入槽位（覆盖元数据）
    pub fn insert(&self, name: impl Into<String>, slot: MemorySlot) {
        self.write().insert(name.into(), slot);
    }

    pub fn remove(&self, name: &str) -> Option<MemorySlot> {
        self.write().remove(name)
    }

    /// 按名称排序的槽位名
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 所有槽位的概览，按名称排序
    pub fn overview(&self) -> Vec<MemoryOverview> {
        self.read()
            .iter()
            .map(|(name, slot)| MemoryOverview {
                name: name.clone(),
                type_name: slot.type_name().to_string(),
                hint: slot.hint(),
                size_kb: slot.size_kb(),
                description: slot.description.clone(),
                preview: slot.preview(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_or_create_only_initializes_once() {
        let store = MemoryStore::new();
        let first = store
            .get_or_create("notes", || Ok(MemorySlot::new(json!([]), "notes")))
            .unwrap();
        assert_eq!(first.value, json!([]));

        let second = store
            .get_or_create("notes", || panic!("should not re-create"))
            .unwrap();
        assert_eq!(second.description, "notes");
    }

    #[test]
    fn test_set_value_keeps_metadata() {
        let store = MemoryStore::new();
        store.insert(
            "count",
            MemorySlot::new(json!(1), "how many").with_hint_override("int"),
        );
        store.set_value("count", json!(2), |v| MemorySlot::new(v, "unused"));

        let slot = store.get("count").unwrap();
        assert_eq!(slot.value, json!(2));
        assert_eq!(slot.description, "how many");
        assert_eq!(slot.hint().as_deref(), Some("int"));

        store.set_value("fresh", json!("x"), |v| MemorySlot::new(v, "created"));
        assert_eq!(store.get("fresh").unwrap().description, "created");
    }

    #[test]
    fn test_overview_sorted_by_name() {
        let store = MemoryStore::new();
        store.insert("zeta", MemorySlot::new(json!("z"), "last"));
        store.insert("alpha", MemorySlot::new(json!({"k": 1}), "first"));

        let overview = store.overview();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].name, "alpha");
        assert_eq!(overview[0].type_name, "object");
        assert_eq!(overview[1].preview, "z");

        let json = serde_json::to_value(&overview[1]).unwrap();
        assert_eq!(json["type"], "string");
    }

    #[test]
    fn test_clones_share_slots() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.insert("k", MemorySlot::new(json!(true), ""));
        assert!(store.contains("k"));
        assert_eq!(store.names(), vec!["k".to_string()]);
        assert!(store.remove("k").is_some());
        assert!(handle.is_empty());
    }
}
