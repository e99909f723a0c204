//! 宿主对象的 YAML 配置
//!
//! ```yaml
//! name: assistant
//! tools:
//!   - name: search
//!     description: "<Search the web>"
//!     tags: [web]
//! agents:
//!   - name: researcher
//!     doc: "<Research a topic>\nYou are careful."
//!     models: [default]
//!     include: ["#web", "#memory"]
//!     exclude: []
//! ```
//!
//! 配置里的工具只有声明没有实现（[`DeclaredTool`]），用于检查可见性；
//! 真正可执行的工具由代码通过 [`AliveBuilder`](crate::alive::AliveBuilder) 登记。

use crate::agent::{AgentSpec, OutputSpec};
use crate::alive::{Alive, AliveBuilder};
use crate::error::{ConfigError, Result};
use crate::llm::LlmClient;
use crate::tools::{
    Selector, Tag, TagSet, Tool, ToolOptions, ToolParameters, ToolRegistry, ToolResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct HostConfig {
    #[serde(default = "default_host_name")]
    pub name: String,
    /// 是否登记内置记忆工具
    #[serde(default = "default_true")]
    pub memory_tools: bool,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub name_prefix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub models: Vec<String>,
    /// 选择器字符串：`*`、`#tag` / `tag:name`、工具名
    #[serde(default)]
    pub include: Vec<Value>,
    #[serde(default)]
    pub exclude: Vec<Value>,
    /// 作为工具登记时附加的标签（`agent` 标签总是带上）
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Text,
    Json { name: String, schema: Value },
    List { items: Box<OutputConfig> },
}

fn default_host_name() -> String {
    "alive".to_string()
}

fn default_true() -> bool {
    true
}

impl HostConfig {
    pub fn load(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        let config: HostConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// 只含声明工具的登记表（不含 agent 和内置工具）
    pub fn build_registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for tool in &self.tools {
            registry.register_with(Arc::new(tool.declared()), tool.options());
        }
        registry
    }

    /// 构建宿主对象；选择器在这里全部解析，任何一个不合法都直接返回错误
    pub fn builder(&self) -> Result<AliveBuilder> {
        let mut builder = Alive::builder(self.name.clone());
        if !self.memory_tools {
            builder = builder.without_memory_tools();
        }
        for tool in &self.tools {
            builder = builder.tool_with(Arc::new(tool.declared()), tool.options());
        }
        for agent in &self.agents {
            builder = builder.agent(agent.to_spec()?);
        }
        Ok(builder)
    }

    pub fn build(&self, llm: Arc<dyn LlmClient>) -> Result<Arc<Alive>> {
        Ok(self.builder()?.llm(llm).build())
    }
}

impl ToolConfig {
    fn declared(&self) -> DeclaredTool {
        DeclaredTool {
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.iter().map(|t| Tag::from(t.as_str())).collect(),
        }
    }

    fn options(&self) -> ToolOptions {
        match &self.name_prefix {
            Some(prefix) => ToolOptions::new().name_prefix(prefix.clone()),
            None => ToolOptions::new(),
        }
    }
}

impl AgentConfig {
    pub fn to_spec(&self) -> Result<AgentSpec> {
        let include = Selector::from_values(&self.include).map_err(|e| {
            ConfigError::ParseFailed(format!("agent '{}' include: {e}", self.name))
        })?;
        let exclude = Selector::from_values(&self.exclude).map_err(|e| {
            ConfigError::ParseFailed(format!("agent '{}' exclude: {e}", self.name))
        })?;

        let mut options = ToolOptions::new().tags(self.tags.iter().map(String::as_str));
        if let Some(prefix) = &self.name_prefix {
            options = options.name_prefix(prefix.clone());
        }

        let mut spec = AgentSpec::new(&self.name, &self.doc)
            .models(self.models.iter().cloned())
            .include_all(include)
            .exclude_all(exclude)
            .tool_options(options);
        if let Some(output) = &self.output {
            spec = spec.output(output.to_spec());
        }
        if let Some(n) = self.max_iterations {
            spec = spec.max_iterations(n);
        }
        if let Some(t) = self.temperature {
            spec = spec.temperature(t);
        }
        Ok(spec)
    }
}

impl OutputConfig {
    pub fn to_spec(&self) -> OutputSpec {
        match self {
            OutputConfig::Text => OutputSpec::Text,
            OutputConfig::Json { name, schema } => OutputSpec::json(name.clone(), schema.clone()),
            OutputConfig::List { items } => OutputSpec::list(items.to_spec()),
        }
    }
}

/// 只在配置中声明、没有实现的工具，执行时返回失败结果
pub struct DeclaredTool {
    name: String,
    description: String,
    tags: TagSet,
}

#[async_trait]
impl Tool for DeclaredTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn tags(&self) -> TagSet {
        self.tags.clone()
    }

    async fn execute(&self, _parameters: ToolParameters) -> Result<ToolResult> {
        Ok(ToolResult::error(format!(
            "tool '{}' is declared in config but has no implementation",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AliveError;
    use crate::testing::MockLlmClient;

    const HOST: &str = r##"
name: assistant
tools:
  - name: A
    tags: [t1]
  - name: B
    tags: [t2]
  - name: C
  - name: fetch
    description: "<Fetch a page>"
    name_prefix: web
agents:
  - name: everything_but_t1
    models: [default]
    include: ["*"]
    exclude: ["#t1", "#memory", "#agent"]
  - name: only_a
    models: [default]
    include: [A]
    exclude: ["*"]
  - name: panel
    doc: "<Ask a panel>\nGive a short answer."
    tags: [t1]
    models: [m1, m2]
    output:
      type: list
      items:
        type: text
"##;

    #[test]
    fn test_parse_host() {
        let config = HostConfig::from_yaml_str(HOST).unwrap();
        assert_eq!(config.name, "assistant");
        assert!(config.memory_tools);
        assert_eq!(config.tools.len(), 4);
        assert_eq!(config.agents.len(), 3);

        let registry = config.build_registry();
        assert_eq!(registry.names(), vec!["A", "B", "C", "web_fetch"]);
        assert_eq!(registry.get("web_fetch").unwrap().description(), "Fetch a page");
    }

    #[test]
    fn test_resolution_from_config() {
        let config = HostConfig::from_yaml_str(HOST).unwrap();
        let host = config.build(Arc::new(MockLlmClient::new())).unwrap();

        let spec = host.agent("everything_but_t1").unwrap();
        assert_eq!(
            host.resolve_names(&spec.tool_request()).unwrap(),
            vec!["B", "C", "web_fetch"]
        );

        let spec = host.agent("only_a").unwrap();
        assert_eq!(host.resolve_names(&spec.tool_request()).unwrap(), vec!["A"]);

        let panel_entry = host.registry_snapshot().get("panel").cloned().unwrap();
        assert!(panel_entry.has_tag(&Tag::agent()));
        assert!(panel_entry.has_tag(&Tag::new("t1")));
        let hide_t1 = crate::tools::ToolRequest::new()
            .include(Selector::tag("agent"))
            .exclude(Selector::tag("t1"));
        assert_eq!(
            host.resolve_names(&hide_t1).unwrap(),
            vec!["everything_but_t1", "only_a"]
        );

        let panel = config.agent("panel").unwrap().to_spec().unwrap();
        assert_eq!(panel.get_output(), &OutputSpec::list(OutputSpec::Text));
        assert_eq!(panel.system_prompt(), "Give a short answer.");
    }

    #[test]
    fn test_non_string_selector_is_rejected() {
        let raw = r#"
agents:
  - name: bad
    models: [m1]
    include: [1]
"#;
        let config = HostConfig::from_yaml_str(raw).unwrap();
        assert!(matches!(
            config.builder(),
            Err(AliveError::Config(ConfigError::ParseFailed(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            HostConfig::load("/definitely/not/here.yaml"),
            Err(AliveError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_declared_tool_reports_missing_implementation() {
        let tool = ToolConfig {
            name: "C".to_string(),
            description: String::new(),
            tags: vec![],
            name_prefix: None,
        }
        .declared();
        let result = tool.execute(ToolParameters::new()).await.unwrap();
        assert!(!result.success);
    }
}
