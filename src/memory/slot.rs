//! 单个记忆槽位及其可观测元数据（类型提示、大小、预览）

use crate::tools::TagSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PREVIEW_MAX_CHARS: usize = 220;
const PREVIEW_MAX_ITEMS: usize = 20;

/// 记忆槽位：值以 JSON 保存，字段声明的 Rust 类型作为结构提示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySlot {
    pub value: Value,
    /// 人类可读的槽位说明
    #[serde(default)]
    pub description: String,
    /// 手动指定的类型提示，优先于声明类型
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    declared_type: Option<String>,
    #[serde(default)]
    pub tags: TagSet,
}

impl MemorySlot {
    pub fn new(value: Value, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
            hint_override: None,
            declared_type: None,
            tags: TagSet::new(),
        }
    }

    /// 记录字段声明的类型，接受 `std::any::type_name` 的完整路径
    pub fn with_declared_type(mut self, type_name: &str) -> Self {
        self.declared_type = Some(short_type_name(type_name));
        self
    }

    pub fn with_hint_override(mut self, hint: impl Into<String>) -> Self {
        self.hint_override = Some(hint.into());
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// 结构提示：手动覆盖值（空白归一化）优先，其次为声明类型
    pub fn hint(&self) -> Option<String> {
        if let Some(hint) = self.hint_override.as_deref().filter(|h| !h.trim().is_empty()) {
            return Some(hint.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        self.declared_type.clone()
    }

    /// 当前值的运行时 JSON 类型
    pub fn type_name(&self) -> &'static str {
        json_kind(&self.value)
    }

    /// 序列化后的近似大小（KB，保留三位小数）
    pub fn size_kb(&self) -> Option<f64> {
        serde_json::to_vec(&self.value)
            .ok()
            .map(|bytes| (bytes.len() as f64 / 1024.0 * 1000.0).round() / 1000.0)
    }

    /// 截断后的预览；提示与运行时类型冲突时追加说明
    pub fn preview(&self) -> String {
        let base = safe_preview(&self.value);
        match self.hint() {
            Some(hint) if hint_conflicts(&hint, &self.value) => {
                format!("{base}  [hint={hint} ≠ runtime={}]", self.type_name())
            }
            _ => base,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > PREVIEW_MAX_CHARS {
        let head: String = s.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{head}…")
    } else {
        s.to_string()
    }
}

fn safe_preview(value: &Value) -> String {
    match value {
        Value::String(s) => truncate(s),
        Value::Array(items) => {
            let head: Vec<&Value> = items.iter().take(PREVIEW_MAX_ITEMS).collect();
            let head = serde_json::to_string(&head).unwrap_or_default();
            truncate(&format!("array(len={}, head={head})", items.len()))
        }
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().take(PREVIEW_MAX_ITEMS).collect();
            truncate(&format!("object(len={}, keys={keys:?})", map.len()))
        }
        other => truncate(&other.to_string()),
    }
}

/// 保守的冲突判断：只比较简单标量类型和容器的外层形状，无法判断时视为不冲突
fn hint_conflicts(hint: &str, value: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    let Some(expected) = expected_kind(hint) else {
        return false;
    };
    match (expected, value) {
        ("float", Value::Number(_)) => false,
        (kind, value) => kind != json_kind(value),
    }
}

fn expected_kind(hint: &str) -> Option<&'static str> {
    let hint = hint.trim();
    let outer = hint
        .split(['<', '['])
        .next()
        .unwrap_or(hint)
        .trim_start_matches('&')
        .trim();
    if outer.len() != hint.len() && !hint.starts_with('&') {
        return match outer {
            "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "list" | "set" | "tuple" => Some("array"),
            "HashMap" | "BTreeMap" | "dict" => Some("object"),
            _ => None,
        };
    }
    match outer {
        "String" | "str" | "string" => Some("string"),
        "bool" => Some("bool"),
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" | "int" => Some("int"),
        "f32" | "f64" | "float" => Some("float"),
        _ => None,
    }
}

/// 去掉类型名中的模块路径：`alloc::vec::Vec<alloc::string::String>` → `Vec<String>`
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(""));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(""));
    out
}
