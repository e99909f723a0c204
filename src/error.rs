use std::fmt;

/// alive-agent 的统一错误类型
#[derive(Debug)]
pub enum AliveError {
    /// LLM 相关错误
    Llm(LlmError),
    /// 工具执行错误
    Tool(ToolError),
    /// include / exclude 选择器错误
    Selector(SelectorError),
    /// 解析错误
    Parse(ParseError),
    /// Agent 执行错误
    Agent(AgentError),
    /// 配置错误
    Config(ConfigError),
    /// 记忆槽位错误
    Memory(MemoryError),
    /// IO 错误
    Io(std::io::Error),
    /// 其他错误
    Other(String),
}

/// LLM 相关错误
#[derive(Debug)]
pub enum LlmError {
    /// 网络请求失败
    NetworkError(String),
    /// API 返回错误状态码
    ApiError { status: u16, message: String },
    /// 响应格式无效
    InvalidResponse(String),
    /// 没有返回内容
    EmptyResponse,
}

/// 工具执行错误
#[derive(Debug)]
pub enum ToolError {
    /// 工具未找到
    NotFound(String),
    /// 参数缺失
    MissingParameter(String),
    /// 参数类型错误
    InvalidParameter { name: String, message: String },
    /// 工具执行失败
    ExecutionFailed { tool: String, message: String },
    /// 工具执行超时
    Timeout(String),
}

/// 选择器错误：include / exclude 中出现了无法识别的条目
#[derive(Debug, PartialEq)]
pub enum SelectorError {
    /// 名称为空
    EmptyName,
    /// 标签值为空（如 `#` 或 `tag:`）
    EmptyTag(String),
    /// exclude 只接受名称、标签和通配符，外部工具不能出现在其中
    ToolInExclude(String),
    /// 不受支持的选择器值类型（来自 JSON / YAML）
    UnsupportedValue(String),
}

/// 解析错误
#[derive(Debug)]
pub enum ParseError {
    /// JSON 解析错误
    JsonError(String),
}

/// Agent 执行错误
#[derive(Debug)]
pub enum AgentError {
    /// 超过最大迭代次数
    MaxIterationsExceeded(usize),
    /// 没有配置任何模型
    NoModels(String),
    /// 多模型并行运行时，输出类型必须是列表
    ParallelOutputType { agent: String, output: String },
    /// 宿主对象上没有该 agent
    NotFound(String),
    /// 宿主对象已被释放
    HostDropped(String),
    /// 没有响应
    NoResponse,
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 环境变量格式错误，应为 `AGENT_MODEL_<ID>_<KEY>`
    EnvFormatError(String),
    /// 不认识的配置项
    UnMatchConfigError(String, String),
    /// 缺少必需的配置项
    MissingConfig(String, String),
    /// 模型未配置
    NotFindModelError(String),
}

/// 记忆槽位错误
#[derive(Debug)]
pub enum MemoryError {
    /// 槽位中的值无法转换为字段声明的类型
    TypeMismatch { name: String, message: String },
    /// 序列化失败
    SerializationError(String),
}

impl fmt::Display for AliveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliveError::Llm(e) => write!(f, "LLM Error: {}", e),
            AliveError::Tool(e) => write!(f, "Tool Error: {}", e),
            AliveError::Selector(e) => write!(f, "Selector Error: {}", e),
            AliveError::Parse(e) => write!(f, "Parse Error: {}", e),
            AliveError::Agent(e) => write!(f, "Agent Error: {}", e),
            AliveError::Config(e) => write!(f, "Config Error: {}", e),
            AliveError::Memory(e) => write!(f, "Memory Error: {}", e),
            AliveError::Io(e) => write!(f, "IO Error: {}", e),
            AliveError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            LlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            LlmError::EmptyResponse => write!(f, "Empty response from LLM"),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool '{}' not found", name),
            ToolError::MissingParameter(name) => write!(f, "Missing parameter: {}", name),
            ToolError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{}': {}", name, message)
            }
            ToolError::ExecutionFailed { tool, message } => {
                write!(f, "Tool '{}' execution failed: {}", tool, message)
            }
            ToolError::Timeout(name) => write!(f, "Tool '{}' timed out", name),
        }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::EmptyName => write!(f, "selector name must not be empty"),
            SelectorError::EmptyTag(raw) => write!(f, "tag selector '{}' has no tag value", raw),
            SelectorError::ToolInExclude(name) => write!(
                f,
                "exclude accepts names, tags or '*', got external tool '{}'",
                name
            ),
            SelectorError::UnsupportedValue(value) => write!(
                f,
                "selector must be a name, tag, '*' or tool, got {}",
                value
            ),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::JsonError(msg) => write!(f, "JSON parse error: {}", msg),
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::MaxIterationsExceeded(n) => {
                write!(f, "Max iterations exceeded: {}", n)
            }
            AgentError::NoModels(agent) => write!(f, "Agent '{}' has no models configured", agent),
            AgentError::ParallelOutputType { agent, output } => write!(
                f,
                "agent '{}' must declare a list output when running on several models, got: {}",
                agent, output
            ),
            AgentError::NotFound(agent) => write!(f, "Agent '{}' not found", agent),
            AgentError::HostDropped(agent) => {
                write!(f, "Host of agent '{}' has been dropped", agent)
            }
            AgentError::NoResponse => write!(f, "No response from LLM"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::EnvFormatError(key) => {
                write!(f, "Invalid env var '{}', expected AGENT_MODEL_<ID>_<KEY>", key)
            }
            ConfigError::UnMatchConfigError(config_key, key) => {
                write!(f, "Unknown config key '{}' in env var '{}'", config_key, key)
            }
            ConfigError::MissingConfig(model_id, field) => {
                write!(f, "Model '{}' is missing config field: {}", model_id, field)
            }
            ConfigError::NotFindModelError(model) => write!(f, "Model '{}' is not configured", model),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::TypeMismatch { name, message } => {
                write!(f, "Memory '{}' has unexpected type: {}", name, message)
            }
            MemoryError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for AliveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AliveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for LlmError {}
impl std::error::Error for ToolError {}
impl std::error::Error for SelectorError {}
impl std::error::Error for ParseError {}
impl std::error::Error for AgentError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for MemoryError {}

// From 转换实现
impl From<std::io::Error> for AliveError {
    fn from(err: std::io::Error) -> Self {
        AliveError::Io(err)
    }
}

impl From<reqwest::Error> for AliveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AliveError::Llm(LlmError::NetworkError("Request timeout".to_string()))
        } else if err.is_connect() {
            AliveError::Llm(LlmError::NetworkError(format!(
                "Connection failed: {}",
                err
            )))
        } else {
            AliveError::Llm(LlmError::NetworkError(err.to_string()))
        }
    }
}

impl From<serde_json::Error> for AliveError {
    fn from(err: serde_json::Error) -> Self {
        AliveError::Parse(ParseError::JsonError(err.to_string()))
    }
}

impl From<serde_yaml::Error> for AliveError {
    fn from(err: serde_yaml::Error) -> Self {
        AliveError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<LlmError> for AliveError {
    fn from(err: LlmError) -> Self {
        AliveError::Llm(err)
    }
}

impl From<ToolError> for AliveError {
    fn from(err: ToolError) -> Self {
        AliveError::Tool(err)
    }
}

impl From<SelectorError> for AliveError {
    fn from(err: SelectorError) -> Self {
        AliveError::Selector(err)
    }
}

impl From<ParseError> for AliveError {
    fn from(err: ParseError) -> Self {
        AliveError::Parse(err)
    }
}

impl From<AgentError> for AliveError {
    fn from(err: AgentError) -> Self {
        AliveError::Agent(err)
    }
}

impl From<ConfigError> for AliveError {
    fn from(err: ConfigError) -> Self {
        AliveError::Config(err)
    }
}

impl From<MemoryError> for AliveError {
    fn from(err: MemoryError) -> Self {
        AliveError::Memory(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, AliveError>;
