//! Heuristic post-hoc review of the last assistant turn.
//!
//! The reflector never blocks the loop: it either proposes a corrected
//! message (which the agent loop splices in place of the last context
//! message) or returns `None`/"no retry", and the run continues either way.

use tracing::debug;

use crate::classifiers::{self, MATH_ACTION_WORDS};
use crate::context::AgentContext;
use crate::message::{Message, Role};
use crate::plan::StepResult;

const VERBOSE_THRESHOLD: usize = 2000;
const BRIEF_THRESHOLD: usize = 10;
const COMPLEX_LENGTH_THRESHOLD: usize = 500;

/// The reflector's verdict on one assistant turn.
#[derive(Debug, Clone)]
pub struct Reflection {
    /// True if the loop should splice in [`Self::corrected_message`].
    pub should_retry: bool,
    /// The proposed replacement for the last context message, present only
    /// when its content actually changed.
    pub corrected_message: Option<Message>,
    /// Human-readable description of the defect found.
    pub feedback: String,
    /// Heuristic confidence in `[0, 1]` that the defect is real.
    pub confidence: f64,
}

/// Reviews `step_result` against `ctx` and proposes a correction, if any.
///
/// Returns `None` for tool-role deltas, empty deltas, or steps that already
/// failed — only a successful chat/assistant turn is ever reflected on.
#[must_use]
pub fn review(step_result: &StepResult, ctx: &AgentContext) -> Option<Reflection> {
    if step_result.error.is_some() {
        return None;
    }
    let last = step_result.delta.last()?;
    if last.role != Role::Assistant {
        return None;
    }

    if let Some(feedback) = malformed_tool_json(last) {
        return Some(Reflection {
            should_retry: false,
            corrected_message: None,
            feedback,
            confidence: 0.9,
        });
    }

    let recent_user = ctx
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .and_then(|m| m.content.as_deref())
        .unwrap_or_default();

    if !last.has_tool_calls() && should_use_tools(recent_user, ctx) {
        let hint = tool_hint(ctx);
        let corrected = last.content.as_deref().map(|c| {
            let mut content = c.to_string();
            content.push_str(&hint);
            Message::assistant(content)
        });
        return Some(Reflection {
            should_retry: corrected.is_some(),
            corrected_message: corrected,
            feedback: "should use tools but none called".to_string(),
            confidence: 0.7,
        });
    }

    let content = last.content.as_deref().unwrap_or_default();

    if content.chars().count() > VERBOSE_THRESHOLD && !is_complex_query(recent_user) {
        let truncated = truncate_to_sentences(content, 3);
        let changed = truncated != content;
        debug!(original_len = content.len(), truncated_len = truncated.len(), "reflector: too verbose");
        return Some(Reflection {
            should_retry: changed,
            corrected_message: changed.then(|| Message::assistant(truncated)),
            feedback: "too verbose".to_string(),
            confidence: 0.6,
        });
    }

    if content.chars().count() < BRIEF_THRESHOLD && !last.has_tool_calls() {
        return Some(Reflection {
            should_retry: false,
            corrected_message: None,
            feedback: "too brief".to_string(),
            confidence: 0.5,
        });
    }

    None
}

/// True if any assistant tool-call carries arguments that were stored as a
/// raw string (the dual "string or parsed value" contract) which does not
/// itself parse as JSON.
fn malformed_tool_json(message: &Message) -> Option<String> {
    let calls = message.tool_calls.as_ref()?;
    calls.iter().find_map(|call| {
        let raw = call.arguments.as_str()?;
        serde_json::from_str::<serde_json::Value>(raw)
            .err()
            .map(|_| format!("malformed JSON in tool call '{}'", call.id))
    })
}

/// Mirrors the planner's "math tool wanted" detection: a math action word
/// or numeric expression pattern is present, and at least one registered
/// tool matches the fixed math-tool-name family, or the user explicitly
/// names a registered tool.
fn should_use_tools(user_text: &str, ctx: &AgentContext) -> bool {
    if ctx.tools().is_empty() {
        return false;
    }
    let mentions_math = classifiers::contains_any(user_text, MATH_ACTION_WORDS)
        || classifiers::has_numeric_expression(user_text);
    let has_math_tool = ctx
        .tools()
        .definitions()
        .iter()
        .any(|t| classifiers::is_math_tool_name(&t.name));
    if mentions_math && has_math_tool {
        return true;
    }
    ctx.tools()
        .definitions()
        .iter()
        .any(|t| classifiers::contains_any(user_text, &[t.name.as_str()]))
}

fn tool_hint(ctx: &AgentContext) -> String {
    // definitions() order is registration-unspecified; sort for deterministic hints.
    let mut names: Vec<String> = ctx.tools().definitions().into_iter().map(|t| t.name).collect();
    names.sort();
    format!("\n\n(Available tools: {})", names.join(", "))
}

/// True if the query is "complex" per the fixed heuristic: two or more
/// `?`/`!` marks, longer than 500 characters, or it mentions code-ish
/// terms — any of which excuses a long reply from the verbosity check.
fn is_complex_query(text: &str) -> bool {
    let punctuation_count = text.chars().filter(|c| *c == '?' || *c == '!').count();
    if punctuation_count >= 2 || text.chars().count() > COMPLEX_LENGTH_THRESHOLD {
        return true;
    }
    classifiers::contains_any(text, &["code", "function", "algorithm", "implementation", "example"])
}

/// Truncates `text` to its first `count` sentences (split on `.`), always
/// ending with a period.
fn truncate_to_sentences(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = text.split('.').filter(|s| !s.trim().is_empty()).collect();
    if sentences.len() <= count {
        return text.to_string();
    }
    let mut result = sentences[..count].join(".");
    result.push('.');
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::message::ToolCall;
    use crate::metrics::Metrics;
    use crate::options::Options;
    use crate::providers::ProviderPool;
    use crate::tool::{Tool, ToolBox, ToolError};

    #[derive(Debug, Clone, Copy, Default)]
    struct MultiplyTool;

    #[derive(Debug, Deserialize)]
    struct MultiplyArgs {
        a: i64,
        b: i64,
    }

    #[async_trait]
    impl Tool for MultiplyTool {
        const NAME: &'static str = "multiply";
        type Args = MultiplyArgs;
        type Output = i64;
        type Error = ToolError;

        fn description(&self) -> String {
            "Multiplies two integers".to_string()
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.a * args.b)
        }
    }

    fn ctx_with_tools(tools: ToolBox) -> AgentContext {
        AgentContext::new(
            vec![Message::user("Multiply 12 by 7")],
            Arc::new(tools),
            Arc::new(ProviderPool::new(Vec::new(), Vec::new(), Default::default(), Default::default())),
            Arc::new(Options::default()),
        )
    }

    #[test]
    fn flags_too_brief() {
        let ctx = ctx_with_tools(ToolBox::new());
        let step = StepResult::message(Message::assistant("ok"), Metrics::default(), None);
        let reflection = review(&step, &ctx).unwrap();
        assert_eq!(reflection.feedback, "too brief");
        assert!(!reflection.should_retry);
    }

    #[test]
    fn flags_too_verbose_and_truncates() {
        let ctx = ctx_with_tools(ToolBox::new());
        let long = "This is a sentence. ".repeat(150);
        let step = StepResult::message(Message::assistant(long), Metrics::default(), None);
        let reflection = review(&step, &ctx).unwrap();
        assert_eq!(reflection.feedback, "too verbose");
        assert!(reflection.should_retry);
        assert!(reflection.corrected_message.is_some());
    }

    #[test]
    fn flags_missing_tool_usage() {
        let mut tools = ToolBox::new();
        tools.add(MultiplyTool);
        let ctx = ctx_with_tools(tools);
        let step = StepResult::message(
            Message::assistant("The area is 105."),
            Metrics::default(),
            None,
        );
        let reflection = review(&step, &ctx).unwrap();
        assert_eq!(reflection.feedback, "should use tools but none called");
    }

    #[test]
    fn flags_malformed_tool_json() {
        let ctx = ctx_with_tools(ToolBox::new());
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "multiply".to_string(),
            arguments: serde_json::Value::String("{not-json".to_string()),
        };
        let step = StepResult::message(Message::assistant_tool_calls(vec![call]), Metrics::default(), None);
        let reflection = review(&step, &ctx).unwrap();
        assert!(reflection.feedback.contains("malformed JSON"));
    }

    #[test]
    fn returns_none_for_clean_short_tool_call() {
        let ctx = ctx_with_tools(ToolBox::new());
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "multiply".to_string(),
            arguments: serde_json::json!({"a": 12, "b": 7}),
        };
        let step = StepResult::message(Message::assistant_tool_calls(vec![call]), Metrics::default(), None);
        assert!(review(&step, &ctx).is_none());
    }
}
