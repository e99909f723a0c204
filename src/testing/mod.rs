//! 测试基础设施
//!
//! 在不依赖真实 LLM / 外部服务的情况下测试 alive-agent 各组件。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockLlmClient`] | 替代真实 LLM，按脚本返回文本或工具调用 |
//! | [`MockTool`] | 替代真实工具，可带标签，用于测试登记、可见性与工具调用 |
//!
//! 所有 Mock 都完全在内存中运行，内部使用 `Arc<Mutex<_>>`，可在多任务测试中共享。

mod mock_llm;
mod mock_tool;

pub use mock_llm::MockLlmClient;
pub use mock_tool::MockTool;
