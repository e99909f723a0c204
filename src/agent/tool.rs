use crate::agent::prompt::AgentArgs;
use crate::alive::Alive;
use crate::error::{AgentError, Result};
use crate::tools::{Tag, TagSet, Tool, ToolParameters, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Weak;

/// 把宿主上的 agent 方法暴露为工具，带 `agent` 标签
///
/// 持有宿主的弱引用，宿主释放后调用返回 [`AgentError::HostDropped`]。
pub struct AgentTool {
    name: String,
    description: String,
    host: Weak<Alive>,
}

impl AgentTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, host: Weak<Alive>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            host,
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "交给该 agent 的任务"
                }
            },
            "additionalProperties": true
        })
    }

    fn tags(&self) -> TagSet {
        TagSet::from([Tag::agent()])
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let host = self
            .host
            .upgrade()
            .ok_or_else(|| AgentError::HostDropped(self.name.clone()))?;

        let mut args = AgentArgs::new();
        if let Some(prompt) = parameters.get("prompt") {
            args = args.arg(prompt.clone());
        }
        // 其余参数按名称排序，保证提示词稳定
        let mut named: Vec<_> = parameters
            .into_iter()
            .filter(|(key, _)| key != "prompt")
            .collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in named {
            args = args.named(key, value);
        }

        let value = host.run_agent(&self.name, args).await?;
        Ok(ToolResult::success(match value {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }
}
