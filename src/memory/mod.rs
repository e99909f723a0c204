//! 记忆系统
//!
//! | 类型 | 作用 |
//! |------|------|
//! | [`MemorySlot`] | 单个槽位：JSON 值 + 说明、类型提示、标签 |
//! | [`MemoryStore`] | 宿主对象的槽位表，可克隆共享 |
//! | [`AliveField`] | 类型化字段，首次访问时以默认值创建槽位 |
//!
//! 内置工具 `read_memory` / `get_memories_overview`（见 [`crate::tools::builtin::memory`]）
//! 让 agent 能读取这些槽位。

pub mod field;
pub mod slot;
pub mod store;

pub use field::AliveField;
pub use slot::{MemorySlot, short_type_name};
pub use store::{MemoryOverview, MemoryStore};
