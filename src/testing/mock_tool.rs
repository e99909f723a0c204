//! Mock 工具，用于测试工具登记、可见性解析以及 agent 的工具调用行为。
//!
//! ```rust
//! use alive_agent::testing::MockTool;
//! use alive_agent::tools::{Tag, Tool};
//! use std::collections::HashMap;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let tool = MockTool::new("search")
//!     .with_description("<Search the web>")
//!     .with_tags(["web"])
//!     .with_response("3 results");
//!
//! assert!(tool.tags().contains(&Tag::new("web")));
//! let result = tool.execute(HashMap::new()).await.unwrap();
//! assert_eq!(result.output, "3 results");
//! assert_eq!(tool.call_count(), 1);
//! # }
//! ```

use crate::error::Result;
use crate::tools::{Tag, TagSet, Tool, ToolParameters, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 可脚本化的 Mock Tool：按顺序返回预设结果，耗尽后返回 `"mock response"`
pub struct MockTool {
    name: String,
    description: String,
    parameters: Value,
    tags: TagSet,
    results: Arc<Mutex<VecDeque<ToolResult>>>,
    calls: Arc<Mutex<Vec<ToolParameters>>>,
}

impl MockTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "A mock tool for testing".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            tags: TagSet::new(),
            results: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    /// 工具自带的标签
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(ToolResult::success(text.into()));
        self
    }

    /// 追加一条失败结果
    pub fn with_failure(self, msg: impl Into<String>) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(ToolResult::error(msg.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_args(&self) -> Option<ToolParameters> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn tags(&self) -> TagSet {
        self.tags.clone()
    }

    async fn execute(&self, params: ToolParameters) -> Result<ToolResult> {
        self.calls.lock().unwrap().push(params);
        let next = self.results.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| ToolResult::success("mock response".to_string())))
    }
}
