//! Extracts a tool-call request embedded in free-form assistant text.
//!
//! Used for providers that cannot emit structured tool-calls: the model is
//! instructed to write `TOOL_CALL: {"name": "...", "arguments": {...}}` in
//! its reply, and this module recovers that request. Four strategies are
//! tried in order, and the first that yields valid JSON wins; only the first
//! recognized call in the text is returned.

use serde_json::Value;

const MARKER: &str = "TOOL_CALL:";

/// One tool-call request recovered from text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCall {
    /// Tool name.
    pub name: String,
    /// Parsed arguments.
    pub arguments: Value,
}

/// Attempts to recover a tool-call request from `content`.
#[must_use]
pub fn parse_text_tool_call(content: &str) -> Option<ParsedToolCall> {
    whole_body(content)
        .or_else(|| marker_brace(content))
        .or_else(|| fenced_block(content))
        .or_else(|| any_brace(content))
}

fn to_call(value: Value) -> Option<ParsedToolCall> {
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = value.get("arguments").cloned().unwrap_or(Value::Null);
    Some(ParsedToolCall { name, arguments })
}

fn whole_body(content: &str) -> Option<ParsedToolCall> {
    let value: Value = serde_json::from_str(content.trim()).ok()?;
    to_call(value)
}

fn marker_brace(content: &str) -> Option<ParsedToolCall> {
    let marker_pos = content.find(MARKER)?;
    let after_marker = &content[marker_pos + MARKER.len()..];
    let brace_offset = after_marker.find('{')?;
    let span = balanced_span(after_marker, brace_offset)?;
    let value: Value = serde_json::from_str(&after_marker[brace_offset..span]).ok()?;
    to_call(value)
}

fn fenced_block(content: &str) -> Option<ParsedToolCall> {
    let mut search_from = 0;
    while let Some(rel) = content[search_from..].find("```") {
        let open = search_from + rel;
        if open > 0 && content.as_bytes()[open - 1] == b'\\' {
            search_from = open + 3;
            continue;
        }
        let after_fence = open + 3;
        let body_start = content[after_fence..]
            .find('\n')
            .map_or(after_fence, |nl| after_fence + nl + 1);
        let Some(close_rel) = content[body_start..].find("```") else {
            return None;
        };
        let body = content[body_start..body_start + close_rel].trim();
        let trimmed = body
            .trim_start_matches(|c: char| c != '{' && c != '[')
            .trim_end_matches(|c: char| c != '}' && c != ']');
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if let Some(call) = to_call(value) {
                return Some(call);
            }
        }
        search_from = body_start + close_rel + 3;
    }
    None
}

fn any_brace(content: &str) -> Option<ParsedToolCall> {
    let start = content.find('{')?;
    let span = balanced_span(content, start)?;
    let value: Value = serde_json::from_str(&content[start..span]).ok()?;
    to_call(value)
}

/// Finds the end (exclusive) of the balanced `{...}` (or `[...]`) span that
/// starts at byte offset `start` in `text`, respecting string literals and
/// escapes so a `}` inside a quoted string does not close the count early.
fn balanced_span(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if start >= bytes.len() {
        return None;
    }
    let open = bytes[start];
    let close = match open {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_body_json() {
        let content = r#"{"name": "add", "arguments": {"a": 1, "b": 2}}"#;
        let call = parse_text_tool_call(content).unwrap();
        assert_eq!(call.name, "add");
    }

    #[test]
    fn parses_marker_prefixed_call() {
        let content =
            r#"Sure, let me compute that. TOOL_CALL: {"name": "multiply", "arguments": {"a": 15, "b": 8}}"#;
        let call = parse_text_tool_call(content).unwrap();
        assert_eq!(call.name, "multiply");
        assert_eq!(call.arguments["a"], 15);
    }

    #[test]
    fn ignores_braces_inside_string_arguments() {
        let content =
            r#"TOOL_CALL: {"name": "echo", "arguments": {"message": "a { b } c"}}"#;
        let call = parse_text_tool_call(content).unwrap();
        assert_eq!(call.arguments["message"], "a { b } c");
    }

    #[test]
    fn parses_fenced_json_block() {
        let content = "Here you go:\n```json\n{\"name\": \"search\", \"arguments\": {\"q\": \"rust\"}}\n```";
        let call = parse_text_tool_call(content).unwrap();
        assert_eq!(call.name, "search");
    }

    #[test]
    fn falls_back_to_bare_braces() {
        let content = r#"result: {"name": "divide", "arguments": {"a": 120, "b": 3}} done"#;
        let call = parse_text_tool_call(content).unwrap();
        assert_eq!(call.name, "divide");
    }

    #[test]
    fn returns_none_for_plain_text() {
        assert!(parse_text_tool_call("just a normal reply").is_none());
    }
}
