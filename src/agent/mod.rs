//! Agent 方法
//!
//! 一个 agent 由 [`AgentSpec`] 声明，登记在宿主 [`Alive`] 上。
//! 调用时：
//!
//! 1. 检查输出类型（多模型并行必须声明为列表）
//! 2. 以 agent 自身名称作为 caller 解析可见工具
//! 3. 每个模型各跑一遍对话 / 工具调用循环，结果按模型顺序收集

mod prompt;
mod runner;
mod spec;
mod tool;

pub use prompt::AgentArgs;
pub use spec::{AgentSpec, OutputSpec};
pub use tool::AgentTool;

use crate::alive::Alive;
use crate::error::Result;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// 在宿主上运行一次 agent
///
/// 单模型直接返回该模型的输出；多模型返回按模型顺序排列的 JSON 数组。
pub async fn invoke(host: &Alive, spec: &AgentSpec, args: &AgentArgs) -> Result<Value> {
    // 输出类型不合法时不做任何工具解析
    let output = spec.run_output()?;
    let tools = host.export_toolset(&spec.tool_request(), &spec.actual_tools)?;
    let user_prompt = args.user_prompt();

    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        agent = %spec.name,
        models = ?spec.models,
        tools = ?tools.list_tools(),
        "开始运行 agent"
    );

    let llm = host.llm();
    let runs = spec
        .models
        .iter()
        .map(|model| runner::run_model(llm, &tools, spec, model, &output, &user_prompt));

    if spec.models.len() == 1 {
        let mut results = try_join_all(runs).await?;
        return Ok(results.pop().unwrap_or(Value::Null));
    }
    Ok(Value::Array(try_join_all(runs).await?))
}
