//! 宿主对象
//!
//! [`Alive`] 持有工具登记表、记忆、agent 方法和 LLM 客户端。
//! 通过 [`AliveBuilder`] 显式登记工具和 agent；每个 agent 同时以 `agent` 标签登记为工具，
//! 因此 agent 之间可以按可见性规则互相调用。

use crate::agent::{self, AgentArgs, AgentSpec, AgentTool};
use crate::error::{AgentError, Result};
use crate::llm::{HttpLlmClient, LlmClient};
use crate::memory::{AliveField, MemorySlot, MemoryStore};
use crate::tools::builtin::{MemoriesOverviewTool, ReadMemoryTool};
use crate::tools::{
    Tool, ToolEntry, ToolExecutionConfig, ToolManager, ToolOptions, ToolRegistry, ToolRequest,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info};

pub struct Alive {
    name: String,
    registry: RwLock<ToolRegistry>,
    agents: RwLock<HashMap<String, AgentSpec>>,
    memory: MemoryStore,
    llm: Arc<dyn LlmClient>,
    tool_execution: ToolExecutionConfig,
    weak_self: Weak<Alive>,
}

impl Alive {
    pub fn builder(name: impl Into<String>) -> AliveBuilder {
        AliveBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    /// 当前登记表的快照
    pub fn registry_snapshot(&self) -> ToolRegistry {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn register_tool(&self, tool: Arc<dyn Tool>, options: ToolOptions) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_with(tool, options);
    }

    /// 登记 agent，并把它作为带 `agent` 标签的工具登记
    pub fn register_agent(&self, spec: AgentSpec) {
        let tool = AgentTool::new(spec.name(), spec.tool_description(), self.weak_self.clone());
        self.register_tool(Arc::new(tool), spec.get_tool_options().clone());
        debug!(host = %self.name, agent = %spec.name(), "登记 agent");
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec.name().to_string(), spec);
    }

    pub fn agent(&self, name: &str) -> Option<AgentSpec> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn resolve_tools(&self, request: &ToolRequest) -> Result<Vec<ToolEntry>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(request)
    }

    /// 可见工具的名称，按输出顺序
    pub fn resolve_names(&self, request: &ToolRequest) -> Result<Vec<String>> {
        Ok(self
            .resolve_tools(request)?
            .iter()
            .map(|e| e.name().to_string())
            .collect())
    }

    pub fn export_toolset(
        &self,
        request: &ToolRequest,
        actual_tools: &[Arc<dyn Tool>],
    ) -> Result<ToolManager> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .export_toolset(request, actual_tools, self.tool_execution.clone())
    }

    pub async fn run_agent(&self, name: &str, args: AgentArgs) -> Result<Value> {
        let spec = self
            .agent(name)
            .ok_or_else(|| AgentError::NotFound(name.to_string()))?;
        info!(host = %self.name, agent = %name, "调用 agent");
        agent::invoke(self, &spec, &args).await
    }

    /// 读取记忆字段，首次访问时以默认值创建
    pub fn get_field<T>(&self, field: &AliveField<T>) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        field.get(&self.memory)
    }

    pub fn set_field<T>(&self, field: &AliveField<T>, value: T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        field.set(&self.memory, value)
    }
}

impl std::fmt::Debug for Alive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alive")
            .field("name", &self.name)
            .field("tools", &self.registry_snapshot().names())
            .field("agents", &self.agent_names())
            .finish()
    }
}

enum Pending {
    Tool(Arc<dyn Tool>, ToolOptions),
    Agent(AgentSpec),
}

/// [`Alive`] 构建器，按调用顺序登记工具和 agent
pub struct AliveBuilder {
    name: String,
    pending: Vec<Pending>,
    memory: MemoryStore,
    llm: Option<Arc<dyn LlmClient>>,
    tool_execution: ToolExecutionConfig,
    memory_tools: bool,
}

impl AliveBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Vec::new(),
            memory: MemoryStore::new(),
            llm: None,
            tool_execution: ToolExecutionConfig::default(),
            memory_tools: true,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tool(self, tool: Arc<dyn Tool>) -> Self {
        self.tool_with(tool, ToolOptions::new())
    }

    pub fn tool_with(mut self, tool: Arc<dyn Tool>, options: ToolOptions) -> Self {
        self.pending.push(Pending::Tool(tool, options));
        self
    }

    pub fn agent(mut self, spec: AgentSpec) -> Self {
        self.pending.push(Pending::Agent(spec));
        self
    }

    /// 预先创建记忆字段的槽位
    pub fn field<T>(self, field: &AliveField<T>) -> Result<Self>
    where
        T: Serialize + DeserializeOwned,
    {
        field.ensure(&self.memory)?;
        Ok(self)
    }

    /// 直接放入一个记忆槽位
    pub fn memory_slot(self, name: impl Into<String>, slot: MemorySlot) -> Self {
        self.memory.insert(name, slot);
        self
    }

    pub fn tool_execution(mut self, config: ToolExecutionConfig) -> Self {
        self.tool_execution = config;
        self
    }

    /// 不登记内置的 read_memory / get_memories_overview
    pub fn without_memory_tools(mut self) -> Self {
        self.memory_tools = false;
        self
    }

    pub fn build(self) -> Arc<Alive> {
        let AliveBuilder {
            name,
            pending,
            memory,
            llm,
            tool_execution,
            memory_tools,
        } = self;
        let llm = llm.unwrap_or_else(|| Arc::new(HttpLlmClient::default()));

        Arc::new_cyclic(|weak: &Weak<Alive>| {
            let mut registry = ToolRegistry::new();
            if memory_tools {
                registry.register(Arc::new(ReadMemoryTool::new(memory.clone())));
                registry.register(Arc::new(MemoriesOverviewTool::new(memory.clone())));
            }

            let mut agents = HashMap::new();
            for item in pending {
                match item {
                    Pending::Tool(tool, options) => {
                        registry.register_with(tool, options);
                    }
                    Pending::Agent(spec) => {
                        let tool =
                            AgentTool::new(spec.name(), spec.tool_description(), weak.clone());
                        registry.register_with(Arc::new(tool), spec.get_tool_options().clone());
                        agents.insert(spec.name().to_string(), spec);
                    }
                }
            }
            info!(host = %name, tools = registry.len(), agents = agents.len(), "宿主对象已构建");

            Alive {
                name,
                registry: RwLock::new(registry),
                agents: RwLock::new(agents),
                memory,
                llm,
                tool_execution,
                weak_self: weak.clone(),
            }
        })
    }
}
