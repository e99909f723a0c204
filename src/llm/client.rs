use crate::error::{LlmError, Result};
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse};
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::time::Instant;
use tracing::{debug, warn};

/// 向 OpenAI 兼容的 `/chat/completions` 地址发送一次非流式请求
pub(crate) async fn post(
    client: &Client,
    url: &str,
    header_map: HeaderMap,
    request_body: &ChatCompletionRequest,
) -> Result<ChatCompletionResponse> {
    let started = Instant::now();
    let response = client
        .post(url)
        .headers(header_map)
        .json(request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        warn!(model = %request_body.model, status = status.as_u16(), "LLM 请求失败");
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    let completion = response
        .json::<ChatCompletionResponse>()
        .await
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    debug!(
        model = %request_body.model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        total_tokens = ?completion.usage.as_ref().and_then(|u| u.total_tokens),
        "LLM 响应"
    );
    Ok(completion)
}
