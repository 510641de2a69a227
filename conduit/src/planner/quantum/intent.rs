//! Phase A: intent recognition.
//!
//! Prompts the most capable available provider with a fixed template and
//! parses its line-oriented reply. Falls back to a deterministic keyword
//! classifier on provider failure or an unparsable response — the engine
//! must always produce *some* intent, even a degraded one.

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::classifiers;
use crate::context::AgentContext;
use crate::message::Message;

/// How involved the task looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// One clear action, no branching.
    Simple,
    /// A couple of related steps.
    Moderate,
    /// Several interdependent steps or ambiguous scope.
    Complex,
    /// Requires deep domain reasoning or many interacting constraints.
    Expert,
}

/// The kind of work the primary intent represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Arithmetic or other numeric computation.
    Calculation,
    /// Information retrieval.
    Search,
    /// Generating new content or artifacts.
    Creation,
    /// Examining or summarizing existing content.
    Analysis,
    /// Scheduling or organizing future work.
    Planning,
    /// Drafting or relaying a message to a third party.
    Communication,
    /// Several distinct task types chained together.
    MultiStep,
    /// Could not be classified.
    Unknown,
}

/// The recognized shape of the user's request.
#[derive(Debug, Clone)]
pub struct Intent {
    /// The main thing the user wants.
    pub primary: String,
    /// Additional goals riding along with the primary one.
    pub secondary: Vec<String>,
    /// Free-text context the classifier extracted.
    pub context: String,
    /// How involved the task looks.
    pub complexity: Complexity,
    /// What kind of task this is.
    pub task_type: TaskType,
    /// Constraints the user expressed (budget, tone, deadline, ...).
    pub constraints: Vec<String>,
    /// True when this intent came from the keyword fallback rather than a
    /// provider's structured reply.
    pub degraded: bool,
}

const INTENT_PROMPT: &str = "Classify the user's most recent request. Reply with exactly these \
lines, one field per line:\nPRIMARY_INTENT: <one sentence>\nSECONDARY_INTENTS: <comma-separated, \
or none>\nCONTEXT: <one sentence>\nCOMPLEXITY: <simple|moderate|complex|expert>\nTASK_TYPE: \
<calculation|search|creation|analysis|planning|communication|multi_step|unknown>\nCONSTRAINTS: \
<comma-separated, or none>";

/// Runs Phase A against the current context.
pub async fn recognize_intent(ctx: &AgentContext, cancel: &CancelToken) -> Intent {
    let Some(user_text) = latest_user_text(ctx) else {
        return keyword_fallback("");
    };

    let Some(provider) = best_primary_provider(ctx) else {
        debug!("quantum planner: no provider available for intent recognition, using keyword fallback");
        return keyword_fallback(user_text);
    };

    let mut messages = ctx.messages().to_vec();
    messages.push(Message::user(INTENT_PROMPT));

    let model = ctx.providers().model_for(provider.id()).to_string();
    let result = provider
        .chat(&model, &messages, None, ctx.options().timeout, cancel)
        .await;

    match result {
        Ok(chat_result) => {
            let reply = chat_result.assistant_message().and_then(|m| m.content.as_deref()).unwrap_or_default();
            parse_intent_reply(reply).unwrap_or_else(|| {
                warn!(provider = provider.id(), "quantum planner: unparsable intent reply, using keyword fallback");
                keyword_fallback(user_text)
            })
        }
        Err(err) => {
            warn!(provider = provider.id(), error = %err, "quantum planner: intent recognition failed, using keyword fallback");
            keyword_fallback(user_text)
        }
    }
}

fn latest_user_text(ctx: &AgentContext) -> Option<&str> {
    ctx.messages().last().and_then(|m| m.content.as_deref())
}

/// Prefers a structured-tool-call provider (it can more reliably follow the
/// line-oriented reply format); falls back to the first configured primary,
/// then the first fallback.
fn best_primary_provider(ctx: &AgentContext) -> Option<std::sync::Arc<dyn crate::providers::Provider>> {
    let pool = ctx.providers();
    pool.primary()
        .iter()
        .find(|p| p.supports_tools())
        .or_else(|| pool.primary().first())
        .or_else(|| pool.fallback().first())
        .cloned()
}

fn parse_intent_reply(reply: &str) -> Option<Intent> {
    let mut primary = None;
    let mut secondary = Vec::new();
    let mut context = String::new();
    let mut complexity = Complexity::Moderate;
    let mut task_type = TaskType::Unknown;
    let mut constraints = Vec::new();

    for line in reply.lines() {
        let (key, value) = line.split_once(':')?;
        let key = key.trim().to_uppercase();
        let value = value.trim();
        match key.as_str() {
            "PRIMARY_INTENT" => primary = Some(value.to_string()),
            "SECONDARY_INTENTS" => secondary = split_list(value),
            "CONTEXT" => context = value.to_string(),
            "COMPLEXITY" => complexity = parse_complexity(value).unwrap_or(Complexity::Moderate),
            "TASK_TYPE" => task_type = parse_task_type(value).unwrap_or(TaskType::Unknown),
            "CONSTRAINTS" => constraints = split_list(value),
            _ => {}
        }
    }

    Some(Intent {
        primary: primary?,
        secondary,
        context,
        complexity,
        task_type,
        constraints,
        degraded: false,
    })
}

fn split_list(value: &str) -> Vec<String> {
    if value.eq_ignore_ascii_case("none") || value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn parse_complexity(value: &str) -> Option<Complexity> {
    match value.to_lowercase().as_str() {
        "simple" => Some(Complexity::Simple),
        "moderate" => Some(Complexity::Moderate),
        "complex" => Some(Complexity::Complex),
        "expert" => Some(Complexity::Expert),
        _ => None,
    }
}

fn parse_task_type(value: &str) -> Option<TaskType> {
    match value.to_lowercase().replace(' ', "_").as_str() {
        "calculation" => Some(TaskType::Calculation),
        "search" => Some(TaskType::Search),
        "creation" => Some(TaskType::Creation),
        "analysis" => Some(TaskType::Analysis),
        "planning" => Some(TaskType::Planning),
        "communication" => Some(TaskType::Communication),
        "multi_step" => Some(TaskType::MultiStep),
        "unknown" => Some(TaskType::Unknown),
        _ => None,
    }
}

/// Deterministic classifier used when no provider is available, the call
/// fails, or the reply cannot be parsed.
fn keyword_fallback(text: &str) -> Intent {
    let task_type = classifiers::task_type_for_text(text).map_or(TaskType::Unknown, |family| match family {
        "calculation" => TaskType::Calculation,
        "search" => TaskType::Search,
        "analysis" => TaskType::Analysis,
        "creation" => TaskType::Creation,
        _ => TaskType::Unknown,
    });

    let complexity = if classifiers::is_multi_step(text) {
        Complexity::Complex
    } else if text.chars().count() > 120 {
        Complexity::Moderate
    } else {
        Complexity::Simple
    };

    let constraints = if classifiers::has_uncertainty(text) {
        vec!["uncertain".to_string()]
    } else {
        Vec::new()
    };

    Intent {
        primary: text.to_string(),
        secondary: Vec::new(),
        context: String::new(),
        complexity,
        task_type,
        constraints,
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let reply = "PRIMARY_INTENT: multiply two numbers\nSECONDARY_INTENTS: none\nCONTEXT: math homework\nCOMPLEXITY: simple\nTASK_TYPE: calculation\nCONSTRAINTS: none";
        let intent = parse_intent_reply(reply).unwrap();
        assert_eq!(intent.primary, "multiply two numbers");
        assert_eq!(intent.complexity, Complexity::Simple);
        assert_eq!(intent.task_type, TaskType::Calculation);
        assert!(!intent.degraded);
    }

    #[test]
    fn rejects_reply_missing_primary_intent() {
        let reply = "COMPLEXITY: simple\nTASK_TYPE: calculation";
        assert!(parse_intent_reply(reply).is_none());
    }

    #[test]
    fn keyword_fallback_detects_multi_step_complexity() {
        let intent = keyword_fallback("Multiply 12 by 7, then divide by 4");
        assert_eq!(intent.complexity, Complexity::Complex);
        assert_eq!(intent.task_type, TaskType::Calculation);
        assert!(intent.degraded);
    }

    #[test]
    fn keyword_fallback_detects_uncertainty_constraint() {
        let intent = keyword_fallback("I'm not sure, maybe find the weather?");
        assert!(intent.constraints.contains(&"uncertain".to_string()));
    }
}
