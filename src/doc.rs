//! 文档字符串拆分
//!
//! 同一段文档同时承载两种用途：`<...>` 块内是暴露给 LLM 的简短工具描述，
//! 块外的其余文字是 agent 的系统提示词。

/// 取第一个 `<...>` 块（块内不能再含 `<` 或 `>`）的内容；没有时原样返回整段文档
pub fn extract_angle_doc(doc: &str) -> Option<String> {
    if doc.is_empty() {
        return None;
    }
    let mut rest = doc;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        match after.find(['<', '>']) {
            Some(end) if after[end..].starts_with('>') && end > 0 => {
                return Some(after[..end].trim().to_string());
            }
            Some(end) if after[end..].starts_with('>') => rest = &after[end + 1..],
            Some(end) => rest = &after[end..],
            None => break,
        }
    }
    Some(doc.to_string())
}

/// 删除所有 `<...>` 块（可跨行）后的文档
pub fn extract_no_angle_doc(doc: &str) -> String {
    let mut out = String::with_capacity(doc.len());
    let mut rest = doc;
    while let Some(open) = rest.find('<') {
        match rest[open + 1..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + 1 + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_doc_takes_first_block() {
        let doc = "Long instructions.\n<Search the web> and <other>";
        assert_eq!(extract_angle_doc(doc).as_deref(), Some("Search the web"));
    }

    #[test]
    fn test_angle_doc_falls_back_to_whole_doc() {
        assert_eq!(extract_angle_doc("  plain doc\n").as_deref(), Some("  plain doc\n"));
        assert_eq!(extract_angle_doc(""), None);
        assert_eq!(extract_angle_doc("   ").as_deref(), Some("   "));
        assert_eq!(extract_angle_doc("a <> b").as_deref(), Some("a <> b"));
    }

    #[test]
    fn test_angle_doc_skips_nested_open() {
        assert_eq!(extract_angle_doc("x < y <real>").as_deref(), Some("real"));
    }

    #[test]
    fn test_no_angle_doc_strips_blocks() {
        let doc = "<Short tool text>\nYou are a researcher.\n<multi\nline> Be brief.";
        assert_eq!(extract_no_angle_doc(doc), "You are a researcher.\n Be brief.");
        assert_eq!(extract_no_angle_doc("keep < unclosed"), "keep < unclosed");
        assert_eq!(extract_no_angle_doc("<only>"), "");
    }
}
