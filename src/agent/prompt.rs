//! agent 调用参数 → 用户提示词

use serde_json::Value;

const EMPTY_PROMPT: &str = "follow the instructions";

/// 一次 agent 调用的参数：位置参数和命名参数，都以 JSON 值传入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentArgs {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

impl AgentArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只有一段文本提示的调用
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new().arg(Value::String(text.into()))
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn named(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// 逐段的用户消息内容；没有任何有效参数时返回默认提示
    pub fn user_content(&self) -> Vec<String> {
        let mut parts = Vec::new();
        for value in &self.positional {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    parts.extend(items.iter().filter(|v| !v.is_null()).map(render));
                }
                other => parts.push(render(other)),
            }
        }
        for (key, value) in &self.named {
            if !value.is_null() {
                parts.push(format!("{key}={}", render(value)));
            }
        }
        if parts.is_empty() {
            parts.push(EMPTY_PROMPT.to_string());
        }
        parts
    }

    pub fn user_prompt(&self) -> String {
        self.user_content().join("\n")
    }
}

impl From<&str> for AgentArgs {
    fn from(text: &str) -> Self {
        Self::prompt(text)
    }
}

impl From<String> for AgentArgs {
    fn from(text: String) -> Self {
        Self::prompt(text)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_args_use_default_prompt() {
        assert_eq!(AgentArgs::new().user_prompt(), "follow the instructions");
        let only_nulls = AgentArgs::new().arg(Value::Null).named("k", Value::Null);
        assert_eq!(only_nulls.user_content(), vec!["follow the instructions"]);
    }

    #[test]
    fn test_positional_and_named_rendering() {
        let args = AgentArgs::new()
            .arg("summarize this")
            .arg(json!(["first", 2, null]))
            .arg(json!({"k": 1}))
            .named("lang", "en")
            .named("limit", 3);
        assert_eq!(
            args.user_content(),
            vec!["summarize this", "first", "2", r#"{"k":1}"#, "lang=en", "limit=3"]
        );
        assert_eq!(args.user_prompt().lines().count(), 6);
    }
}
