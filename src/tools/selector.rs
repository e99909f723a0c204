//! include / exclude 选择器
//!
//! 选择器字符串约定：
//!
//! | 写法 | 含义 |
//! |------|------|
//! | `*` | 通配符，表示当前登记的全部工具（优先级最弱） |
//! | `#memory` / `tag:memory` | 标签 `memory` |
//! | 其他 | 精确的工具名 |
//!
//! 外部工具只能通过 [`Selector::tool`] 构造，且只允许出现在 include 中。

use crate::error::SelectorError;
use crate::tools::{Tag, Tool};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 通配符
pub const WILDCARD: &str = "*";

const TAG_PREFIX: &str = "tag:";
const TAG_SIGIL: char = '#';

#[derive(Clone)]
pub enum Selector {
    /// 精确工具名
    Name(String),
    /// 按标签匹配
    Tag(Tag),
    /// 全部工具
    Wildcard,
    /// 不在登记表中的外部工具，原样追加到结果末尾
    Tool(Arc<dyn Tool>),
}

impl Selector {
    /// 精确名称；`*` 始终表示通配符
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == WILDCARD {
            Self::Wildcard
        } else {
            Self::Name(name)
        }
    }

    pub fn tag(tag: impl Into<Tag>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn tool(tool: Arc<dyn Tool>) -> Self {
        Self::Tool(tool)
    }

    /// 按字符串约定解析选择器
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::EmptyName);
        }
        if trimmed == WILDCARD {
            return Ok(Self::Wildcard);
        }
        let tag = trimmed
            .strip_prefix(TAG_PREFIX)
            .or_else(|| trimmed.strip_prefix(TAG_SIGIL));
        match tag {
            Some(value) if value.trim().is_empty() => Err(SelectorError::EmptyTag(raw.to_string())),
            Some(value) => Ok(Self::Tag(Tag::new(value.trim()))),
            None => Ok(Self::Name(trimmed.to_string())),
        }
    }

    /// 从 JSON / YAML 值解析；只接受字符串
    pub fn from_value(value: &Value) -> Result<Self, SelectorError> {
        match value {
            Value::String(s) => Self::parse(s),
            other => Err(SelectorError::UnsupportedValue(other.to_string())),
        }
    }

    pub fn parse_all<I, S>(raws: I) -> Result<Vec<Self>, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raws.into_iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    pub fn from_values(values: &[Value]) -> Result<Vec<Self>, SelectorError> {
        values.iter().map(Self::from_value).collect()
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Tag> for Selector {
    fn from(tag: Tag) -> Self {
        Self::Tag(tag)
    }
}

impl From<Arc<dyn Tool>> for Selector {
    fn from(tool: Arc<dyn Tool>) -> Self {
        Self::Tool(tool)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Selector::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Selector::Wildcard => f.write_str("Wildcard"),
            Selector::Tool(tool) => f.debug_tuple("Tool").field(&tool.name()).finish(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => f.write_str(name),
            Selector::Tag(tag) => write!(f, "{TAG_SIGIL}{tag}"),
            Selector::Wildcard => f.write_str(WILDCARD),
            Selector::Tool(tool) => write!(f, "<tool {}>", tool.name()),
        }
    }
}

/// 无法被选择器精确选中的名称：通配符本身，以及会被解析成标签的写法
pub(crate) fn is_reserved_name(name: &str) -> bool {
    name == WILDCARD || name.starts_with(TAG_SIGIL) || name.starts_with(TAG_PREFIX)
}

/// 一组选择器按种类拆分后的结果
pub(crate) struct SelectorSet {
    /// 显式名称（不含通配符）
    pub names: HashSet<String>,
    pub tags: HashSet<Tag>,
    pub wildcard: bool,
    /// 外部工具，按首次出现顺序、按名称去重
    pub tools: Vec<Arc<dyn Tool>>,
}

impl SelectorSet {
    fn empty() -> Self {
        Self {
            names: HashSet::new(),
            tags: HashSet::new(),
            wildcard: false,
            tools: Vec::new(),
        }
    }

    pub fn from_include(selectors: &[Selector]) -> Self {
        let mut set = Self::empty();
        for selector in selectors {
            match selector {
                Selector::Name(name) if name == WILDCARD => set.wildcard = true,
                Selector::Name(name) => {
                    set.names.insert(name.clone());
                }
                Selector::Tag(tag) => {
                    set.tags.insert(tag.clone());
                }
                Selector::Wildcard => set.wildcard = true,
                Selector::Tool(tool) => {
                    if !set.tools.iter().any(|t| t.name() == tool.name()) {
                        set.tools.push(tool.clone());
                    }
                }
            }
        }
        set
    }

    pub fn from_exclude(selectors: &[Selector]) -> Result<Self, SelectorError> {
        let mut set = Self::empty();
        for selector in selectors {
            match selector {
                Selector::Name(name) if name == WILDCARD => set.wildcard = true,
                Selector::Name(name) => {
                    set.names.insert(name.clone());
                }
                Selector::Tag(tag) => {
                    set.tags.insert(tag.clone());
                }
                Selector::Wildcard => set.wildcard = true,
                Selector::Tool(tool) => {
                    return Err(SelectorError::ToolInExclude(tool.name().to_string()));
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTool;
    use serde_json::json;

    #[test]
    fn test_star_name_is_wildcard() {
        assert!(matches!(Selector::name("*"), Selector::Wildcard));

        let raw_star = [Selector::Name(WILDCARD.to_string())];
        assert!(SelectorSet::from_include(&raw_star).wildcard);
        let exclude = SelectorSet::from_exclude(&raw_star).unwrap();
        assert!(exclude.wildcard);
        assert!(exclude.names.is_empty());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name("*"));
        assert!(is_reserved_name("#memory"));
        assert!(is_reserved_name("tag:memory"));
        assert!(!is_reserved_name("read_memory"));
    }

    #[test]
    fn test_parse_conventions() {
        assert!(matches!(Selector::parse("*"), Ok(Selector::Wildcard)));
        assert!(matches!(Selector::parse("#memory"), Ok(Selector::Tag(t)) if t.as_str() == "memory"));
        assert!(matches!(Selector::parse("tag:agent"), Ok(Selector::Tag(t)) if t.as_str() == "agent"));
        assert!(matches!(Selector::parse(" search "), Ok(Selector::Name(n)) if n == "search"));
    }

    #[test]
    fn test_parse_rejects_empty_values() {
        assert_eq!(Selector::parse("  ").unwrap_err(), SelectorError::EmptyName);
        assert_eq!(
            Selector::parse("#").unwrap_err(),
            SelectorError::EmptyTag("#".to_string())
        );
        assert_eq!(
            Selector::parse("tag: ").unwrap_err(),
            SelectorError::EmptyTag("tag: ".to_string())
        );
    }

    #[test]
    fn test_from_value_rejects_non_strings() {
        let err = Selector::from_values(&[json!("read_memory"), json!(3)]).unwrap_err();
        assert_eq!(err, SelectorError::UnsupportedValue("3".to_string()));
    }

    #[test]
    fn test_exclude_rejects_tools() {
        let tool: Arc<dyn Tool> = Arc::new(MockTool::new("external"));
        let err = SelectorSet::from_exclude(&[Selector::Wildcard, Selector::tool(tool)])
            .err()
            .unwrap();
        assert_eq!(err, SelectorError::ToolInExclude("external".to_string()));
    }

    #[test]
    fn test_include_dedups_tools_by_name() {
        let a: Arc<dyn Tool> = Arc::new(MockTool::new("ext"));
        let b: Arc<dyn Tool> = Arc::new(MockTool::new("ext"));
        let set = SelectorSet::from_include(&[
            Selector::tool(a),
            Selector::name("x"),
            Selector::name("x"),
            Selector::tool(b),
        ]);
        assert_eq!(set.tools.len(), 1);
        assert_eq!(set.names.len(), 1);
        assert!(!set.wildcard);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let tag = Selector::tag("web");
        assert_eq!(tag.to_string(), "#web");
        assert!(matches!(Selector::parse(&tag.to_string()), Ok(Selector::Tag(t)) if t.as_str() == "web"));
    }
}
