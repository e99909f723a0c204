//! Agent 方法声明

use crate::doc::{extract_angle_doc, extract_no_angle_doc};
use crate::error::{AgentError, ParseError, Result};
use crate::llm::types::ResponseFormat;
use crate::tools::{Selector, Tag, Tool, ToolOptions, ToolRequest};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// agent 的输出类型
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    /// 自由文本，结果为 JSON 字符串
    Text,
    /// 按 JSON Schema 输出
    Json { name: String, schema: Value },
    /// 元素类型为 `inner` 的列表；多模型并行运行时每个模型输出一个 `inner`
    List(Box<OutputSpec>),
}

impl OutputSpec {
    pub fn json(name: impl Into<String>, schema: Value) -> Self {
        Self::Json {
            name: name.into(),
            schema,
        }
    }

    pub fn list(inner: OutputSpec) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn json_schema(&self) -> Value {
        match self {
            OutputSpec::Text => json!({"type": "string"}),
            OutputSpec::Json { schema, .. } => schema.clone(),
            OutputSpec::List(inner) => json!({"type": "array", "items": inner.json_schema()}),
        }
    }

    pub fn response_format(&self) -> Option<ResponseFormat> {
        match self {
            OutputSpec::Text => None,
            OutputSpec::Json { name, schema } => {
                Some(ResponseFormat::json_schema(name.clone(), schema.clone()))
            }
            OutputSpec::List(_) => Some(ResponseFormat::json_schema("list", self.json_schema())),
        }
    }

    /// 把模型的最终回复转换为输出值
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self {
            OutputSpec::Text => Ok(Value::String(content.to_string())),
            _ => {
                let body = strip_code_fence(content);
                serde_json::from_str(body).map_err(|e| {
                    ParseError::JsonError(format!("{e} (output type {self}): {body}")).into()
                })
            }
        }
    }
}

impl fmt::Display for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSpec::Text => f.write_str("text"),
            OutputSpec::Json { name, .. } => f.write_str(name),
            OutputSpec::List(inner) => write!(f, "list[{inner}]"),
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// 一个 agent 方法：文档（描述 + 系统提示词）、模型、工具可见性和输出类型
///
/// 通过构建器链式调用设置各项参数，再登记到宿主对象上。
#[derive(Clone)]
pub struct AgentSpec {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) models: Vec<String>,
    pub(crate) include: Vec<Selector>,
    pub(crate) exclude: Vec<Selector>,
    /// 现成的外部工具集，不参与可见性解析，总是附加在最后
    pub(crate) actual_tools: Vec<Arc<dyn Tool>>,
    pub(crate) output: OutputSpec,
    /// 最大迭代轮次，防止死循环
    pub(crate) max_iterations: usize,
    pub(crate) temperature: Option<f32>,
    /// 作为工具登记时的额外标签和名称选项，`agent` 标签总是带上
    pub(crate) tool_options: ToolOptions,
}

impl AgentSpec {
    pub fn new(name: &str, doc: &str) -> Self {
        Self {
            name: name.to_string(),
            doc: doc.to_string(),
            models: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            actual_tools: Vec::new(),
            output: OutputSpec::Text,
            max_iterations: 10,
            temperature: None,
            tool_options: ToolOptions::new(),
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.models.push(model.to_string());
        self
    }

    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.extend(models.into_iter().map(Into::into));
        self
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

    pub fn actual_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.actual_tools.push(tool);
        self
    }

    pub fn output(mut self, output: OutputSpec) -> Self {
        self.output = output;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// 作为工具登记时附加的标签
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tool_options = self.tool_options.tag(tag);
        self
    }

    pub fn tool_options(mut self, options: ToolOptions) -> Self {
        self.tool_options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_tool_options(&self) -> &ToolOptions {
        &self.tool_options
    }

    /// 在登记表中的名称（考虑名称覆盖和前缀）
    pub fn tool_name(&self) -> String {
        self.tool_options.exposed_name(&self.name)
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn get_models(&self) -> &[String] {
        &self.models
    }

    pub fn get_output(&self) -> &OutputSpec {
        &self.output
    }

    /// 文档中 `<...>` 以外的部分
    pub fn system_prompt(&self) -> String {
        extract_no_angle_doc(&self.doc)
    }

    /// 作为工具暴露时的描述
    pub fn tool_description(&self) -> String {
        extract_angle_doc(&self.doc).unwrap_or_default()
    }

    /// 本 agent 的工具可见性请求，`caller` 为自身的登记名
    pub fn tool_request(&self) -> ToolRequest {
        ToolRequest::new()
            .include_all(self.include.iter().cloned())
            .exclude_all(self.exclude.iter().cloned())
            .caller(self.tool_name())
    }

    /// 单个模型实际使用的输出类型；多模型时要求声明为列表并返回元素类型
    pub fn run_output(&self) -> Result<OutputSpec> {
        if self.models.is_empty() {
            return Err(AgentError::NoModels(self.name.clone()).into());
        }
        if self.models.len() == 1 {
            return Ok(self.output.clone());
        }
        match &self.output {
            OutputSpec::List(inner) => Ok((**inner).clone()),
            other => Err(AgentError::ParallelOutputType {
                agent: self.name.clone(),
                output: other.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("models", &self.models)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field(
                "actual_tools",
                &self.actual_tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("output", &self.output)
            .field("tool_options", &self.tool_options)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AliveError;

    #[test]
    fn test_doc_split() {
        let spec = AgentSpec::new(
            "researcher",
            "<Research a topic and report>\nYou are a careful researcher. Cite sources.",
        );
        assert_eq!(spec.tool_description(), "Research a topic and report");
        assert_eq!(spec.system_prompt(), "You are a careful researcher. Cite sources.");
    }

    #[test]
    fn test_tool_request_uses_own_name_as_caller() {
        let spec = AgentSpec::new("planner", "")
            .include(Selector::Wildcard)
            .exclude(Selector::tag("memory"));
        let request = spec.tool_request();
        assert_eq!(request.caller.as_deref(), Some("planner"));
        assert_eq!(request.include.len(), 1);
        assert_eq!(request.exclude.len(), 1);

        let prefixed = AgentSpec::new("planner", "")
            .tool_options(ToolOptions::new().name_prefix("team"));
        assert_eq!(prefixed.tool_request().caller.as_deref(), Some("team_planner"));
    }

    #[test]
    fn test_run_output_single_and_parallel() {
        let single = AgentSpec::new("a", "").model("m1");
        assert_eq!(single.run_output().unwrap(), OutputSpec::Text);

        let parallel = AgentSpec::new("a", "")
            .models(["m1", "m2"])
            .output(OutputSpec::list(OutputSpec::Text));
        assert_eq!(parallel.run_output().unwrap(), OutputSpec::Text);

        let bad = AgentSpec::new("a", "").models(["m1", "m2"]);
        assert!(matches!(
            bad.run_output(),
            Err(AliveError::Agent(AgentError::ParallelOutputType { output, .. })) if output == "text"
        ));

        assert!(matches!(
            AgentSpec::new("a", "").run_output(),
            Err(AliveError::Agent(AgentError::NoModels(_)))
        ));
    }

    #[test]
    fn test_parse_output() {
        assert_eq!(OutputSpec::Text.parse("hi").unwrap(), json!("hi"));

        let spec = OutputSpec::json("answer", json!({"type": "object"}));
        assert_eq!(
            spec.parse("```json\n{\"ok\": true}\n```").unwrap(),
            json!({"ok": true})
        );
        assert!(matches!(
            spec.parse("not json"),
            Err(AliveError::Parse(ParseError::JsonError(_)))
        ));

        let list = OutputSpec::list(OutputSpec::Text);
        assert_eq!(list.to_string(), "list[text]");
        assert_eq!(list.json_schema(), json!({"type": "array", "items": {"type": "string"}}));
    }
}
