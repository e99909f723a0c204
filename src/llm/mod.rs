mod client;
pub mod config;
pub mod types;

use crate::error::{AliveError, LlmError, Result};
use crate::llm::client::post;
use crate::llm::config::{Config, ModelConfig};
use crate::llm::types::{ChatCompletionRequest, Message, ResponseFormat, ToolDefinition};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::sync::Arc;

pub fn assemble_req_header(model: &ModelConfig) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::new();

    header_map.insert(
        "Authorization",
        format!("Bearer {}", model.apikey)
            .parse()
            .map_err(|e| AliveError::Other(format!("Invalid Authorization header: {}", e)))?,
    );
    header_map.insert(
        "Content-Type",
        "application/json"
            .parse()
            .map_err(|e| AliveError::Other(format!("Invalid Content-Type header: {}", e)))?,
    );
    Ok(header_map)
}

/// 一次对话请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// 模型名，对应 [`ModelConfig::model`]
    pub model: String,
    pub messages: Vec<Message>,
    /// 本轮可调用的工具（空 = 不带工具）
    pub tools: Vec<ToolDefinition>,
    pub response_format: Option<ResponseFormat>,
    pub temperature: Option<f32>,
}

/// agent 调用 LLM 的接口，返回模型回复的 assistant 消息（文本或工具调用）
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<Message>;
}

/// OpenAI 兼容 `/chat/completions` 接口的默认实现
pub struct HttpLlmClient {
    client: Arc<Client>,
}

impl Default for HttpLlmClient {
    fn default() -> Self {
        Self::new(Arc::new(Client::new()))
    }
}

impl HttpLlmClient {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<Message> {
        let model = Config::get_model(&request.model)?;
        let tools = (!request.tools.is_empty()).then_some(request.tools);
        let tool_choice = tools.as_ref().map(|_| "auto".to_string());
        let request_body = ChatCompletionRequest {
            model: model.model.clone(),
            messages: request.messages,
            tools,
            tool_choice,
            temperature: request.temperature,
            max_tokens: None,
            stream: Some(false),
            response_format: request.response_format,
        };

        let header_map = assemble_req_header(&model)?;
        let response = post(&self.client, &model.baseurl, header_map, &request_body).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::EmptyResponse.into())
    }
}
