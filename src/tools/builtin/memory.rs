//! 记忆工具：read_memory / get_memories_overview
//!
//! 两个工具都带 `memory` 标签，agent 可以用 `#memory` 整体放行或屏蔽。
//!
//! | 工具 | 对应 MemoryStore 操作 |
//! |------|----------------------|
//! | `read_memory` | `store.value(name)` |
//! | `get_memories_overview` | `store.overview()` |

use crate::error::ToolError;
use crate::memory::MemoryStore;
use crate::tools::{Tag, TagSet, Tool, ToolParameters, ToolResult};
use serde_json::{Value, json};
use tracing::debug;

// ── ReadMemoryTool ───────────────────────────────────────────────────────────

/// 读取单个记忆槽位的值
pub struct ReadMemoryTool {
    store: MemoryStore,
}

impl ReadMemoryTool {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for ReadMemoryTool {
    fn name(&self) -> &str {
        "read_memory"
    }

    fn description(&self) -> &str {
        "Read ONE memory value by name. Use get_memories_overview first to see which memories exist."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "记忆槽位名称"
                }
            },
            "required": ["name"]
        })
    }

    fn tags(&self) -> TagSet {
        TagSet::from([Tag::memory()])
    }

    async fn execute(&self, parameters: ToolParameters) -> crate::error::Result<ToolResult> {
        let name = match parameters.get("name") {
            None | Some(Value::Null) => {
                return Err(ToolError::MissingParameter("name".to_string()).into());
            }
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(ToolError::InvalidParameter {
                    name: "name".to_string(),
                    message: format!("expected a string, got {other}"),
                }
                .into());
            }
        };

        debug!(memory = %name, "read_memory");

        Ok(match self.store.value(name) {
            Some(Value::String(s)) => ToolResult::success(s),
            Some(value) => ToolResult::success(value.to_string()),
            None => ToolResult::error(format!("memory '{name}' does not exist")),
        })
    }
}

// ── MemoriesOverviewTool ─────────────────────────────────────────────────────

/// 列出所有记忆槽位的名称、类型、提示、大小、说明和预览
pub struct MemoriesOverviewTool {
    store: MemoryStore,
}

impl MemoriesOverviewTool {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for MemoriesOverviewTool {
    fn name(&self) -> &str {
        "get_memories_overview"
    }

    fn description(&self) -> &str {
        "Overview of the agent memories. Returns a list of {name, type, hint, size_kb, description, preview}."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn tags(&self) -> TagSet {
        TagSet::from([Tag::memory()])
    }

    async fn execute(&self, _parameters: ToolParameters) -> crate::error::Result<ToolResult> {
        let overview = self.store.overview();
        debug!(count = overview.len(), "get_memories_overview");
        Ok(ToolResult::success(serde_json::to_string(&overview)?))
    }
}
