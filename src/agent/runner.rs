//! 单个模型上的对话 / 工具调用循环

use crate::agent::spec::{AgentSpec, OutputSpec};
use crate::error::{AgentError, Result};
use crate::llm::types::{Message, ToolCall};
use crate::llm::{ChatRequest, LlmClient};
use crate::tools::{ToolManager, ToolParameters};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

/// 在 `model` 上运行一次 agent，直到模型给出不带工具调用的回复
pub(crate) async fn run_model(
    llm: &dyn LlmClient,
    tools: &ToolManager,
    spec: &AgentSpec,
    model: &str,
    output: &OutputSpec,
    user_prompt: &str,
) -> Result<Value> {
    let mut messages = Vec::with_capacity(2);
    let system_prompt = spec.system_prompt();
    if !system_prompt.is_empty() {
        messages.push(Message::system(system_prompt));
    }
    messages.push(Message::user(user_prompt.to_string()));

    let definitions = tools.get_tool_definitions();
    let response_format = output.response_format();

    for iteration in 0..spec.max_iterations {
        debug!(agent = %spec.name, model, iteration = iteration + 1, "调用 LLM");

        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.clone(),
            tools: definitions.clone(),
            response_format: response_format.clone(),
            temperature: spec.temperature,
        };
        let message = llm.chat(request).await?;

        let calls = message.tool_calls.clone().unwrap_or_default();
        if calls.is_empty() {
            let content = message.content.ok_or(AgentError::NoResponse)?;
            info!(agent = %spec.name, model, iterations = iteration + 1, "agent 完成");
            return output.parse(&content);
        }

        // assistant 的工具调用消息必须先进入历史，之后的 tool 消息才能对应上
        messages.push(message);
        let results = join_all(calls.iter().map(|call| execute_call(tools, call))).await;
        for (call, content) in calls.into_iter().zip(results) {
            messages.push(Message::tool_result(call.id, call.function.name, content));
        }
    }

    Err(AgentError::MaxIterationsExceeded(spec.max_iterations).into())
}

/// 执行一次工具调用；任何失败都转成文本回传给模型
async fn execute_call(tools: &ToolManager, call: &ToolCall) -> String {
    let name = call.function.name.as_str();
    let params = match parse_arguments(&call.function.arguments) {
        Ok(params) => params,
        Err(e) => {
            warn!(tool = %name, error = %e, "工具参数解析失败");
            return format!("Error: invalid arguments for {name}: {e}");
        }
    };

    debug!(tool = %name, "执行工具");
    match tools.execute_tool(name, params).await {
        Ok(result) if result.success => result.output,
        Ok(result) => {
            let message = result.error.unwrap_or_default();
            warn!(tool = %name, error = %message, "工具返回失败");
            format!("Error: {message}")
        }
        Err(e) => {
            warn!(tool = %name, error = %e, "工具执行出错");
            format!("Error: {e}")
        }
    }
}

fn parse_arguments(raw: &str) -> std::result::Result<ToolParameters, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(ToolParameters::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Ok(ToolParameters::new()),
    }
}
