//! 工具系统
//!
//! 定义 [`Tool`] trait 和 [`ToolManager`]（绑定、执行、并发限流、超时重试）。
//! 宿主对象的工具登记在 [`registry::ToolRegistry`] 中，每次 agent 调用时
//! 通过 include / exclude [`selector::Selector`] 计算出可见工具，再绑定到一个 `ToolManager`。
//! 内置工具位于 [`builtin`]。

pub mod builtin;
pub mod registry;
pub mod selector;
pub mod tag;

pub use registry::{ToolEntry, ToolOptions, ToolRegistry, ToolRequest};
pub use selector::Selector;
pub use tag::{Tag, TagSet};

use crate::error::{AliveError, Result, ToolError};
use crate::llm::types::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// 工具执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

/// 工具执行配置：超时、重试、并发度
#[derive(Debug, Clone)]
pub struct ToolExecutionConfig {
    /// 单次工具执行超时（毫秒）。0 = 不限制。默认 30_000（30 秒）
    pub timeout_ms: u64,
    /// 工具执行失败时是否自动重试。默认 false
    pub retry_on_fail: bool,
    /// `retry_on_fail=true` 时的最大重试次数。默认 2
    pub max_retries: u32,
    /// 重试前首次等待（毫秒），每次翻倍指数退避。默认 200
    pub retry_delay_ms: u64,
    /// 并行工具调用时的最大并发数。`None` = 不限制（全并发）。默认 `None`
    pub max_concurrency: Option<usize>,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            retry_on_fail: false,
            max_retries: 2,
            retry_delay_ms: 200,
            max_concurrency: None,
        }
    }
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
        }
    }
}

pub type ToolParameters = HashMap<String, serde_json::Value>;

/// 工具接口，所有内置工具、agent 方法和外部工具均实现此 trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    /// 工具文档。若包含 `<...>` 块，则只把块内文字作为描述暴露给 LLM
    fn description(&self) -> &str;
    /// 工具参数的 JSON Schema 定义
    fn parameters(&self) -> serde_json::Value;
    /// 工具自带的标签，登记时会与额外指定的标签合并
    fn tags(&self) -> TagSet {
        TagSet::new()
    }
    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult>;
}

/// 绑定到 [`ToolManager`] 的一个工具：暴露给 LLM 的名称和描述可以与工具自身不同
#[derive(Clone)]
struct BoundTool {
    name: String,
    description: String,
    tool: Arc<dyn Tool>,
}

/// 一次 agent 调用实际可用的工具集合，按绑定顺序输出工具定义
pub struct ToolManager {
    tools: Vec<BoundTool>,
    index: HashMap<String, usize>,
    config: ToolExecutionConfig,
    /// 并发限流器：`Some(sem)` 表示最多同时执行 N 个工具；`None` = 不限制
    semaphore: Option<Arc<Semaphore>>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::new_with_config(ToolExecutionConfig::default())
    }

    pub fn new_with_config(config: ToolExecutionConfig) -> Self {
        let semaphore = config
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n.max(1))));
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            semaphore,
            config,
        }
    }

    /// 返回并发度限制（`None` = 不限制）
    pub fn max_concurrency(&self) -> Option<usize> {
        self.config.max_concurrency
    }

    /// 以工具自身的名称和描述绑定
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        self.bind(name, description, tool);
    }

    /// 以指定名称和描述绑定；同名工具原位替换，保持原有顺序
    pub fn bind(&mut self, name: String, description: String, tool: Arc<dyn Tool>) {
        let bound = BoundTool {
            name: name.clone(),
            description,
            tool,
        };
        match self.index.get(&name) {
            Some(&pos) => {
                warn!(tool = %name, "同名工具已绑定，覆盖旧工具");
                self.tools[pos] = bound;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(bound);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get_tool(&self, tool_name: &str) -> Option<&dyn Tool> {
        self.index
            .get(tool_name)
            .map(|&pos| &*self.tools[pos].tool)
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::new(&t.name, &t.description, t.tool.parameters()))
            .collect()
    }

    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: ToolParameters,
    ) -> Result<ToolResult> {
        let tool = self
            .get_tool(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        let _permit = match &self.semaphore {
            Some(sem) => Some(sem.acquire().await.map_err(|e| ToolError::ExecutionFailed {
                tool: tool_name.to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        let max_retries = if self.config.retry_on_fail {
            self.config.max_retries
        } else {
            0
        };

        let mut last_err: Option<AliveError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay_ms = self.config.retry_delay_ms * (1u64 << (attempt as u64 - 1).min(5));
                debug!(tool = %tool_name, attempt, delay_ms, "工具重试");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let result = if self.config.timeout_ms > 0 {
                match tokio::time::timeout(
                    Duration::from_millis(self.config.timeout_ms),
                    tool.execute(parameters.clone()),
                )
                .await
                {
                    Ok(r) => r,
                    Err(_) => Err(ToolError::Timeout(tool_name.to_string()).into()),
                }
            } else {
                tool.execute(parameters.clone()).await
            };

            match result {
                Ok(r) => return Ok(r),
                Err(e) if attempt < max_retries => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ToolError::NotFound(tool_name.to_string()).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTool;

    #[tokio::test]
    async fn test_bind_keeps_order_and_replaces_in_place() {
        let mut manager = ToolManager::new();
        manager.register(Arc::new(MockTool::new("a")));
        manager.register(Arc::new(MockTool::new("b")));
        manager.bind(
            "a".to_string(),
            "replaced".to_string(),
            Arc::new(MockTool::new("a2").with_response("from a2")),
        );

        assert_eq!(manager.list_tools(), vec!["a", "b"]);
        let defs = manager.get_tool_definitions();
        assert_eq!(defs[0].function.description, "replaced");

        let result = manager.execute_tool("a", HashMap::new()).await.unwrap();
        assert_eq!(result.output, "from a2");
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let manager = ToolManager::new();
        let err = manager.execute_tool("missing", HashMap::new()).await;
        assert!(matches!(
            err,
            Err(AliveError::Tool(ToolError::NotFound(name))) if name == "missing"
        ));
    }
}
