use crate::error::{MemoryError, Result};
use crate::memory::slot::MemorySlot;
use crate::memory::store::MemoryStore;
use crate::tools::TagSet;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// 带默认值的类型化记忆字段
///
/// 宿主对象的访问器显式调用 [`get`](AliveField::get) / [`set`](AliveField::set)；
/// 第一次访问时以默认值创建槽位，之后的写入只更新值、保留说明等元数据。
///
/// ```rust
/// use alive_agent::memory::{AliveField, MemoryStore};
///
/// let store = MemoryStore::new();
/// let visits = AliveField::new("visits", 0u32, "how many times the user came back");
///
/// assert_eq!(visits.get(&store).unwrap(), 0);
/// visits.set(&store, 3).unwrap();
/// assert_eq!(visits.get(&store).unwrap(), 3);
/// assert_eq!(store.get("visits").unwrap().hint().as_deref(), Some("u32"));
/// ```
#[derive(Debug, Clone)]
pub struct AliveField<T> {
    name: String,
    default: T,
    description: String,
    tags: TagSet,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AliveField<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>, default: T, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default,
            description: description.into(),
            tags: TagSet::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn new_slot(&self, value: Value) -> MemorySlot {
        MemorySlot::new(value, self.description.clone())
            .with_declared_type(std::any::type_name::<T>())
            .with_tags(self.tags.clone())
    }

    fn to_json(&self, value: &T) -> Result<Value> {
        serde_json::to_value(value)
            .map_err(|e| MemoryError::SerializationError(e.to_string()).into())
    }

    /// 确保槽位存在（用默认值创建），不读取值
    pub fn ensure(&self, store: &MemoryStore) -> Result<()> {
        store.get_or_create(&self.name, || Ok(self.new_slot(self.to_json(&self.default)?)))?;
        Ok(())
    }

    pub fn get(&self, store: &MemoryStore) -> Result<T> {
        let slot =
            store.get_or_create(&self.name, || Ok(self.new_slot(self.to_json(&self.default)?)))?;
        serde_json::from_value(slot.value).map_err(|e| {
            MemoryError::TypeMismatch {
                name: self.name.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn set(&self, store: &MemoryStore, value: T) -> Result<()> {
        let json = self.to_json(&value)?;
        store.set_value(&self.name, json, |v| self.new_slot(v));
        Ok(())
    }
}
