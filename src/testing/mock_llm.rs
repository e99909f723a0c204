//! Mock LLM 客户端，用于在不发起真实 HTTP 请求的情况下测试 agent 调用流程。
//!
//! # 示例
//!
//! ```rust
//! use alive_agent::testing::MockLlmClient;
//! use alive_agent::llm::{ChatRequest, LlmClient};
//! use alive_agent::llm::types::Message;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockLlmClient::new()
//!     .with_tool_call("read_memory", serde_json::json!({"name": "city"}))
//!     .with_response("Haifa");
//!
//! let request = ChatRequest {
//!     model: "gpt-4o".to_string(),
//!     messages: vec![Message::user("where?".to_string())],
//!     tools: vec![],
//!     response_format: None,
//!     temperature: None,
//! };
//! let first = mock.chat(request.clone()).await.unwrap();
//! assert!(first.tool_calls.is_some());
//! let second = mock.chat(request).await.unwrap();
//! assert_eq!(second.content.as_deref(), Some("Haifa"));
//! assert_eq!(mock.call_count(), 2);
//! # }
//! ```

use crate::error::{AliveError, LlmError, Result};
use crate::llm::types::{Message, ToolCall};
use crate::llm::{ChatRequest, LlmClient};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// 预设响应
enum MockLlmResponse {
    Message(Message),
    Err(AliveError),
}

/// 可脚本化的 Mock LLM 客户端。
///
/// 优先消费请求模型专属的队列（[`with_model_response`](MockLlmClient::with_model_response)），
/// 否则消费公共队列；都耗尽后返回 `EmptyResponse` 错误。
/// 所有请求都被记录，可通过 [`call_count`](MockLlmClient::call_count) /
/// [`last_request`](MockLlmClient::last_request) 检查。
pub struct MockLlmClient {
    shared: Arc<Mutex<VecDeque<MockLlmResponse>>>,
    per_model: Arc<Mutex<HashMap<String, VecDeque<MockLlmResponse>>>>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
    next_call_id: Arc<Mutex<usize>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(VecDeque::new())),
            per_model: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_call_id: Arc::new(Mutex::new(0)),
        }
    }

    fn push(self, response: MockLlmResponse) -> Self {
        self.shared.lock().unwrap().push_back(response);
        self
    }

    fn tool_call(&self, name: &str, arguments: &Value) -> ToolCall {
        let mut id = self.next_call_id.lock().unwrap();
        *id += 1;
        ToolCall::function(format!("call_{}", *id), name, arguments.to_string())
    }

    /// 追加一条纯文本回复
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(MockLlmResponse::Message(Message::assistant(text.into())))
    }

    /// 追加一条调用单个工具的回复
    pub fn with_tool_call(self, name: &str, arguments: Value) -> Self {
        let call = self.tool_call(name, &arguments);
        self.push(MockLlmResponse::Message(Message::assistant_with_tools(vec![call])))
    }

    /// 追加一条同时调用多个工具的回复
    pub fn with_tool_calls(self, calls: Vec<(&str, Value)>) -> Self {
        let calls = calls
            .iter()
            .map(|(name, args)| self.tool_call(name, args))
            .collect();
        self.push(MockLlmResponse::Message(Message::assistant_with_tools(calls)))
    }

    /// 为指定模型追加一条纯文本回复
    pub fn with_model_response(self, model: &str, text: impl Into<String>) -> Self {
        self.per_model
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(MockLlmResponse::Message(Message::assistant(text.into())));
        self
    }

    /// 追加一条错误响应（用于测试错误处理路径）
    pub fn with_error(self, err: AliveError) -> Self {
        self.push(MockLlmResponse::Err(err))
    }

    pub fn with_network_error(self, msg: impl Into<String>) -> Self {
        self.with_error(AliveError::Llm(LlmError::NetworkError(msg.into())))
    }

    /// 已发生的调用总次数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 最后一次请求（若从未调用则返回 `None`）
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// 所有历史请求（按时序排列）
    pub fn all_requests(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// 剩余未消费的公共预设响应数量
    pub fn remaining(&self) -> usize {
        self.shared.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<Message> {
        let model = request.model.clone();
        self.calls.lock().unwrap().push(request);

        let scripted = self
            .per_model
            .lock()
            .unwrap()
            .get_mut(&model)
            .and_then(VecDeque::pop_front);
        let next = match scripted {
            Some(r) => Some(r),
            None => self.shared.lock().unwrap().pop_front(),
        };
        match next {
            Some(MockLlmResponse::Message(message)) => Ok(message),
            Some(MockLlmResponse::Err(e)) => Err(e),
            None => Err(AliveError::Llm(LlmError::EmptyResponse)),
        }
    }
}
