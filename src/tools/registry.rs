//! 工具登记表与可见性解析
//!
//! 宿主对象在构造时显式登记自己的工具（名称、标签、实现），
//! 每次 agent 调用时用 [`ToolRegistry::resolve`] 根据 include / exclude 计算可见工具。
//!
//! ## 优先级（从强到弱）
//!
//! 1. exclude 中的显式名称：一定排除
//! 2. exclude 中的标签：排除，除非 include 中显式写了该名称
//! 3. include 中的显式名称 / 标签
//! 4. 通配符 `*`：include 时表示「全部，除了被排除的」，
//!    exclude 时表示「全部排除，只留下被显式名称或标签允许的」
//!
//! 发起调用的 agent（`caller`）看不到自己，除非 include 中显式写了它的名称；
//! 通配符和标签都不算。

use crate::doc::extract_angle_doc;
use crate::error::Result;
use crate::tools::selector::{SelectorSet, is_reserved_name};
use crate::tools::{Selector, Tag, TagSet, Tool, ToolExecutionConfig, ToolManager};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 登记表中的一个工具
#[derive(Clone)]
pub struct ToolEntry {
    name: String,
    tags: TagSet,
    description: String,
    tool: Arc<dyn Tool>,
}

impl ToolEntry {
    /// 外部工具直接包装为条目：使用工具自身的名称和标签
    fn external(tool: Arc<dyn Tool>) -> Self {
        Self {
            name: tool.name().to_string(),
            tags: tool.tags(),
            description: describe(tool.as_ref()),
            tool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// 暴露给 LLM 的描述
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("description", &self.description)
            .finish()
    }
}

fn describe(tool: &dyn Tool) -> String {
    extract_angle_doc(tool.description()).unwrap_or_default()
}

/// 登记时的可选项
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    /// 额外标签，与工具自带标签合并
    pub tags: TagSet,
    /// 覆盖工具自身的名称
    pub name: Option<String>,
    /// 名称前缀，登记名为 `{prefix}_{name}`
    pub name_prefix: Option<String>,
}

impl ToolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// 以 `base` 为工具自身名称时的登记名
    pub fn exposed_name(&self, base: &str) -> String {
        let base = self.name.as_deref().unwrap_or(base);
        match self.name_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{base}"),
            _ => base.to_string(),
        }
    }

    fn entry_name(&self, tool: &dyn Tool) -> String {
        self.exposed_name(tool.name())
    }
}

/// 一次解析请求
#[derive(Debug, Clone, Default)]
pub struct ToolRequest {
    /// 为空时等同于 `[*]`
    pub include: Vec<Selector>,
    /// 为空时不排除任何工具
    pub exclude: Vec<Selector>,
    /// 发起调用的 agent 名称
    pub caller: Option<String>,
}

impl ToolRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, selector: impl Into<Selector>) -> Self {
        self.include.push(selector.into());
        self
    }

    pub fn exclude(mut self, selector: impl Into<Selector>) -> Self {
        self.exclude.push(selector.into());
        self
    }

    pub fn include_all(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.include.extend(selectors);
        self
    }

    pub fn exclude_all(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.exclude.extend(selectors);
        self
    }

    pub fn caller(mut self, name: impl Into<String>) -> Self {
        self.caller = Some(name.into());
        self
    }
}

/// 宿主对象的工具登记表，保持登记顺序，名称唯一
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.register_with(tool, ToolOptions::default())
    }

    /// 登记工具；同名条目原位替换
    ///
    /// `*`、`#...`、`tag:...` 形式的名称无法被选择器选中，不予登记。
    pub fn register_with(&mut self, tool: Arc<dyn Tool>, options: ToolOptions) -> &mut Self {
        let name = options.entry_name(tool.as_ref());
        if is_reserved_name(&name) {
            warn!(tool = %name, "工具名与选择器写法冲突，忽略登记");
            return self;
        }
        let mut tags = tool.tags();
        tags.extend(options.tags);
        let entry = ToolEntry {
            description: describe(tool.as_ref()),
            name,
            tags,
            tool,
        };
        debug!(tool = %entry.name, tags = ?entry.tags, "登记工具");
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn names_tagged(&self, tags: &HashSet<Tag>) -> HashSet<&str> {
        if tags.is_empty() {
            return HashSet::new();
        }
        self.entries
            .iter()
            .filter(|e| e.tags.iter().any(|t| tags.contains(t)))
            .map(|e| e.name.as_str())
            .collect()
    }

    /// 计算本次请求可见的工具：登记顺序的条目在前，include 中的外部工具按给出顺序追加在后
    pub fn resolve(&self, request: &ToolRequest) -> Result<Vec<ToolEntry>> {
        let include = if request.include.is_empty() {
            SelectorSet::from_include(&[Selector::Wildcard])
        } else {
            SelectorSet::from_include(&request.include)
        };
        let exclude = SelectorSet::from_exclude(&request.exclude)?;

        let all_names: HashSet<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
        let explicit_include: HashSet<&str> = include.names.iter().map(String::as_str).collect();

        // exclude 的通配符只决定下面的起点，展开后的名称集合不参与后续过滤
        let mut include_names = explicit_include.clone();
        if include.wildcard {
            include_names.extend(all_names.iter().copied());
        }

        let include_by_tag = self.names_tagged(&include.tags);
        let exclude_by_tag = self.names_tagged(&exclude.tags);

        let candidates: HashSet<&str> = if exclude.wildcard {
            explicit_include.union(&include_by_tag).copied().collect()
        } else {
            include_names
                .union(&include_by_tag)
                .copied()
                .filter(|name| all_names.contains(name))
                .collect()
        };

        let mut visible: HashSet<&str> = candidates
            .into_iter()
            .filter(|name| !exclude.names.contains(*name))
            .filter(|name| !exclude_by_tag.contains(name) || explicit_include.contains(name))
            .collect();

        if let Some(caller) = request.caller.as_deref()
            && !explicit_include.contains(caller)
        {
            visible.remove(caller);
        }

        let mut resolved: Vec<ToolEntry> = self
            .entries
            .iter()
            .filter(|e| visible.contains(e.name.as_str()))
            .cloned()
            .collect();
        resolved.extend(include.tools.into_iter().map(ToolEntry::external));

        debug!(
            caller = ?request.caller,
            visible = ?resolved.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            "解析工具可见性"
        );
        Ok(resolved)
    }

    /// 解析可见工具并绑定为 [`ToolManager`]；`actual_tools` 为现成的外部工具集，追加在最后
    pub fn export_toolset(
        &self,
        request: &ToolRequest,
        actual_tools: &[Arc<dyn Tool>],
        config: ToolExecutionConfig,
    ) -> Result<ToolManager> {
        let mut manager = ToolManager::new_with_config(config);
        for entry in self.resolve(request)? {
            manager.bind(entry.name, entry.description, entry.tool);
        }
        for tool in actual_tools {
            manager.register(tool.clone());
        }
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AliveError, SelectorError};
    use crate::testing::MockTool;
    use crate::tools::selector::WILDCARD;

    fn tool(name: &str) -> Arc<dyn Tool> {
        Arc::new(MockTool::new(name))
    }

    fn registry(spec: &[(&str, &[&str])]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for (name, tags) in spec {
            registry.register_with(tool(name), ToolOptions::new().tags(tags.iter().copied()));
        }
        registry
    }

    fn names(entries: &[ToolEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    fn resolve(registry: &ToolRegistry, request: ToolRequest) -> Vec<String> {
        registry
            .resolve(&request)
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    #[test]
    fn test_empty_registry_resolves_to_nothing() {
        let registry = ToolRegistry::new();
        assert!(resolve(&registry, ToolRequest::new()).is_empty());
    }

    #[test]
    fn test_wildcard_includes_everything_in_order() {
        let registry = registry(&[("c", &[]), ("a", &["t1"]), ("b", &[])]);
        let all = resolve(&registry, ToolRequest::new().include(Selector::Wildcard));
        assert_eq!(all, vec!["c", "a", "b"]);
        // include 为空等同于通配符
        assert_eq!(resolve(&registry, ToolRequest::new()), all);
    }

    #[test]
    fn test_exclude_wildcard_alone_hides_everything() {
        let registry = registry(&[("a", &["t1"]), ("b", &[])]);
        let request = ToolRequest::new().exclude(Selector::Wildcard);
        // include 为空时默认是 `*`，但 exclude `*` 之后只有显式名称或标签能留下
        assert!(resolve(&registry, request).is_empty());
    }

    #[test]
    fn test_exclude_wildcard_keeps_explicit_name() {
        let registry = registry(&[("A", &[]), ("B", &[]), ("C", &[])]);
        let request = ToolRequest::new()
            .include(Selector::name("A"))
            .exclude(Selector::Wildcard);
        assert_eq!(resolve(&registry, request), vec!["A"]);
    }

    #[test]
    fn test_exclude_wildcard_keeps_tag_matches() {
        let registry = registry(&[("a", &["t1"]), ("b", &["t2"]), ("c", &["t1"])]);
        let request = ToolRequest::new()
            .include(Selector::tag("t1"))
            .exclude(Selector::Wildcard);
        assert_eq!(resolve(&registry, request), vec!["a", "c"]);
    }

    #[test]
    fn test_wildcard_in_both_lists_uses_exclude_baseline() {
        let registry = registry(&[("a", &[]), ("b", &[])]);
        let request = ToolRequest::new()
            .include(Selector::Wildcard)
            .include(Selector::name("b"))
            .exclude(Selector::Wildcard);
        assert_eq!(resolve(&registry, request), vec!["b"]);
    }

    #[test]
    fn test_tag_exclude_with_wildcard_include() {
        let registry = registry(&[("A", &["t1"]), ("B", &["t2"]), ("C", &[])]);
        let request = ToolRequest::new()
            .include(Selector::Wildcard)
            .exclude(Selector::tag("t1"));
        assert_eq!(resolve(&registry, request), vec!["B", "C"]);
    }

    #[test]
    fn test_explicit_name_overrides_tag_exclude() {
        let registry = registry(&[("A", &["t1"]), ("B", &["t1"])]);
        let request = ToolRequest::new()
            .include(Selector::name("B"))
            .include(Selector::tag("t1"))
            .exclude(Selector::tag("t1"));
        assert_eq!(resolve(&registry, request), vec!["B"]);
    }

    #[test]
    fn test_tag_include_does_not_override_tag_exclude() {
        let registry = registry(&[("a", &["t1", "t2"]), ("b", &["t2"])]);
        let request = ToolRequest::new()
            .include(Selector::tag("t2"))
            .exclude(Selector::tag("t1"));
        assert_eq!(resolve(&registry, request), vec!["b"]);
    }

    #[test]
    fn test_explicit_name_exclude_always_wins() {
        let registry = registry(&[("a", &["t1"]), ("b", &[])]);
        let request = ToolRequest::new()
            .include(Selector::name("a"))
            .include(Selector::tag("t1"))
            .include(Selector::name("b"))
            .exclude(Selector::name("a"));
        assert_eq!(resolve(&registry, request), vec!["b"]);

        let request = ToolRequest::new()
            .include(Selector::name("a"))
            .exclude(Selector::name("a"))
            .exclude(Selector::Wildcard);
        assert!(resolve(&registry, request).is_empty());
    }

    #[test]
    fn test_caller_hidden_from_wildcard_and_tags() {
        let registry = registry(&[("foo", &["agent"]), ("bar", &["agent"])]);
        let request = ToolRequest::new().include(Selector::Wildcard).caller("foo");
        assert_eq!(resolve(&registry, request), vec!["bar"]);

        let request = ToolRequest::new().include(Selector::tag("agent")).caller("foo");
        assert_eq!(resolve(&registry, request), vec!["bar"]);
    }

    #[test]
    fn test_caller_visible_when_named() {
        let registry = registry(&[("foo", &[]), ("bar", &[])]);
        let request = ToolRequest::new()
            .include(Selector::Wildcard)
            .include(Selector::name("foo"))
            .caller("foo");
        assert_eq!(resolve(&registry, request), vec!["foo", "bar"]);

        // 显式排除仍然优先
        let request = ToolRequest::new()
            .include(Selector::name("foo"))
            .exclude(Selector::name("foo"))
            .caller("foo");
        assert!(resolve(&registry, request).is_empty());
    }

    #[test]
    fn test_unknown_names_and_tags_are_ignored() {
        let registry = registry(&[("a", &[]), ("b", &[])]);
        let request = ToolRequest::new()
            .include(Selector::name("ghost"))
            .include(Selector::name("a"))
            .exclude(Selector::tag("nope"))
            .exclude(Selector::name("phantom"));
        assert_eq!(resolve(&registry, request), vec!["a"]);

        let request = ToolRequest::new()
            .include(Selector::name("ghost"))
            .exclude(Selector::Wildcard);
        assert!(resolve(&registry, request).is_empty());
    }

    #[test]
    fn test_external_tools_appended_after_registry_entries() {
        let registry = registry(&[("a", &["t1"]), ("b", &[])]);
        let request = ToolRequest::new()
            .include(Selector::tool(tool("ext2")))
            .include(Selector::Wildcard)
            .include(Selector::tool(tool("ext1")))
            .include(Selector::tool(tool("ext2")))
            .exclude(Selector::Wildcard);
        // 外部工具不受 exclude 影响，按给出顺序去重追加
        assert_eq!(resolve(&registry, request), vec!["ext2", "ext1"]);

        let request = ToolRequest::new()
            .include(Selector::name("b"))
            .include(Selector::tool(tool("ext")));
        assert_eq!(resolve(&registry, request), vec!["b", "ext"]);
    }

    #[test]
    fn test_tool_in_exclude_fails_fast() {
        let registry = registry(&[("a", &[])]);
        let request = ToolRequest::new().exclude(Selector::tool(tool("ext")));
        let err = registry.resolve(&request).unwrap_err();
        assert!(matches!(
            err,
            AliveError::Selector(SelectorError::ToolInExclude(name)) if name == "ext"
        ));
    }

    #[test]
    fn test_star_name_selector_acts_as_wildcard() {
        let registry = registry(&[("a", &[]), ("b", &[])]);
        let included = ToolRequest::new().include(Selector::Name(WILDCARD.to_string()));
        assert_eq!(resolve(&registry, included), vec!["a", "b"]);

        let excluded = ToolRequest::new().exclude(Selector::Name(WILDCARD.to_string()));
        assert!(resolve(&registry, excluded).is_empty());
    }

    #[test]
    fn test_reserved_names_are_not_registered() {
        let mut registry = registry(&[("a", &[]), ("b", &[])]);
        registry.register(tool("*"));
        registry.register(tool("#hidden"));
        registry.register_with(tool("x"), ToolOptions::new().name("tag:x"));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_include_with_only_external_tools() {
        let registry = registry(&[("a", &[]), ("b", &["t1"])]);
        let request = ToolRequest::new().include(tool("ext"));
        assert_eq!(resolve(&registry, request), vec!["ext"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = registry(&[("a", &["t1"]), ("b", &["t2"]), ("c", &[])]);
        let request = ToolRequest::new()
            .include(Selector::Wildcard)
            .exclude(Selector::tag("t2"))
            .caller("c");
        let first = resolve(&registry, request.clone());
        let second = resolve(&registry, request);
        assert_eq!(first, second);
        assert_eq!(first, vec!["a"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_merges_tags_and_applies_prefix() {
        let mut registry = ToolRegistry::new();
        let tool: Arc<dyn Tool> = Arc::new(MockTool::new("lookup").with_tags(["search"]));
        registry.register_with(
            tool,
            ToolOptions::new().tag("web").name_prefix("ext"),
        );
        let entry = registry.get("ext_lookup").unwrap();
        assert!(entry.has_tag(&Tag::new("search")));
        assert!(entry.has_tag(&Tag::new("web")));

        registry.register_with(Arc::new(MockTool::new("x")), ToolOptions::new().name("renamed"));
        assert_eq!(registry.names(), vec!["ext_lookup", "renamed"]);
    }

    #[test]
    fn test_register_same_name_replaces_in_place() {
        let mut registry = registry(&[("a", &["old"]), ("b", &[])]);
        registry.register_with(tool("a"), ToolOptions::new().tag("new"));
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.get("a").unwrap().has_tag(&Tag::new("new")));
        assert!(!registry.get("a").unwrap().has_tag(&Tag::new("old")));
    }

    #[test]
    fn test_description_uses_angle_block() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(
            MockTool::new("summarize").with_description("<Summarize a text> Long internal notes."),
        ));
        assert_eq!(registry.get("summarize").unwrap().description(), "Summarize a text");
    }

    #[test]
    fn test_export_toolset_appends_actual_tools() {
        let registry = registry(&[("a", &[]), ("b", &["t1"])]);
        let request = ToolRequest::new().exclude(Selector::tag("t1"));
        let manager = registry
            .export_toolset(&request, &[tool("mcp")], ToolExecutionConfig::default())
            .unwrap();
        assert_eq!(manager.list_tools(), vec!["a", "mcp"]);
        assert_eq!(names(&registry.resolve(&request).unwrap()), vec!["a"]);
    }
}
