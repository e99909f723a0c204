//! 工具标签
//!
//! 标签是普通字符串的新类型封装，一个工具可以有多个标签，一个标签也可以标记多个工具。
//! 在选择器字符串中用 `#memory` 或 `tag:memory` 表示标签，以免与工具名混淆。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 单个标签值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

/// 工具的标签集合（有序，便于输出稳定）
pub type TagSet = BTreeSet<Tag>;

impl Tag {
    /// 内置记忆工具（`read_memory` / `get_memories_overview`）的标签
    pub const MEMORY: &'static str = "memory";
    /// 每个 agent 方法注册为工具时自动携带的标签
    pub const AGENT: &'static str = "agent";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn memory() -> Self {
        Self::new(Self::MEMORY)
    }

    pub fn agent() -> Self {
        Self::new(Self::AGENT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 把任意标签来源收集为 [`TagSet`]，重复值自动去重
pub fn tag_set<I, T>(tags: I) -> TagSet
where
    I: IntoIterator<Item = T>,
    T: Into<Tag>,
{
    tags.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_deduplicates() {
        let tags = tag_set(["memory", "agent", "memory"]);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&Tag::memory()));
        assert!(tags.contains(&Tag::agent()));
    }

    #[test]
    fn test_tag_serializes_as_plain_string() {
        let json = serde_json::to_string(&Tag::new("search")).unwrap();
        assert_eq!(json, "\"search\"");
        let back: Tag = serde_json::from_str("\"search\"").unwrap();
        assert_eq!(back.as_str(), "search");
    }
}
