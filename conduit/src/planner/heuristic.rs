//! Fast, one-shot keyword planner: no provider calls of its own, just a
//! scan of the tool registry against the latest user turn.

use crate::classifiers;
use crate::context::AgentContext;
use crate::message::{Message, Role};
use crate::plan::{Plan, PlanStep, Priority, StepResult, StepType};

/// Builds the initial [`Plan`] for the current context.
///
/// Not a user turn yields a single [`StepType::Completion`] step. A user
/// turn is scanned against the tool registry; if no tool looks needed the
/// plan is a single chat step, otherwise a `chat -> tool_execution -> chat`
/// sequence tagged with the tools the first chat is expected to call.
#[must_use]
pub fn plan(ctx: &AgentContext) -> Plan {
    let Some(last) = ctx.messages().last() else {
        return Plan::completion();
    };
    if last.role != Role::User {
        return Plan::completion();
    }
    let text = last.content.as_deref().unwrap_or_default();
    let needed = potentially_needed_tools(text, ctx);

    if needed.is_empty() {
        return Plan::new("direct", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
    }

    Plan::new(
        "iterative",
        vec![
            PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(needed),
            PlanStep::new(StepType::ToolExecution, Priority::Critical),
            PlanStep::new(StepType::Chat, Priority::Normal),
        ],
    )
}

/// Names, in deterministic (sorted) order, of registered tools the user
/// text plausibly needs, per the four detection rules in the module docs.
fn potentially_needed_tools(text: &str, ctx: &AgentContext) -> Vec<String> {
    let multi_step = classifiers::is_multi_step(text);
    let math_word_or_expr =
        classifiers::contains_any(text, classifiers::MATH_ACTION_WORDS) || classifiers::has_numeric_expression(text);

    let mut needed: Vec<String> = ctx
        .tools()
        .definitions()
        .into_iter()
        .filter(|def| {
            let name_mentioned = classifiers::contains_any(text, &[def.name.as_str()]);
            let description_action_word_match = classifiers::TOOL_DESCRIPTION_ACTION_WORDS
                .iter()
                .any(|w| def.description.to_lowercase().contains(w) && text.to_lowercase().contains(w));
            let math_rule = math_word_or_expr && classifiers::is_math_tool_name(&def.name);
            let multi_step_promotion = multi_step && classifiers::is_math_tool_name(&def.name);
            name_mentioned || description_action_word_match || math_rule || multi_step_promotion
        })
        .map(|def| def.name)
        .collect();
    needed.sort();
    needed.dedup();
    needed
}

/// Adapts `plan` after one executor step, per the fixed rule order:
/// completion on success, simplified recovery on error, drain pending
/// tool-calls, continue after a tool response, else drop the plan's head.
#[must_use]
pub fn adapt(plan: Plan, step_result: &StepResult, ctx: &AgentContext) -> Plan {
    if step_result.is_complete {
        return Plan::completion();
    }
    if step_result.error.is_some() {
        return Plan::new("recovery", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
    }

    let last = ctx.messages().last();
    if last.is_some_and(Message::has_tool_calls) {
        return Plan::new(
            "iterative",
            vec![
                PlanStep::new(StepType::ToolExecution, Priority::Critical),
                PlanStep::new(StepType::Chat, Priority::Normal),
            ],
        );
    }
    if last.is_some_and(|m| m.role == Role::Tool) {
        return Plan::new("iterative", vec![PlanStep::new(StepType::Chat, Priority::Normal)]);
    }

    let mut steps = plan.steps;
    steps.pop_front();
    Plan { steps, ..plan }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
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
            "Multiplies two numbers".to_string()
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.a * args.b)
        }
    }

    fn ctx(messages: Vec<Message>, tools: ToolBox) -> AgentContext {
        AgentContext::new(
            messages,
            Arc::new(tools),
            Arc::new(ProviderPool::new(Vec::new(), Vec::new(), Default::default(), Default::default())),
            Arc::new(Options::default()),
        )
    }

    #[test]
    fn non_user_turn_yields_completion() {
        let context = ctx(vec![Message::system("sys")], ToolBox::new());
        let result = plan(&context);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.strategy, "completion");
    }

    #[test]
    fn empty_conversation_yields_completion() {
        let context = ctx(Vec::new(), ToolBox::new());
        let result = plan(&context);
        assert_eq!(result.strategy, "completion");
    }

    #[test]
    fn no_matching_tools_yields_single_chat() {
        let context = ctx(vec![Message::user("Tell me a joke.")], ToolBox::new());
        let result = plan(&context);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.strategy, "direct");
    }

    #[test]
    fn math_request_builds_iterative_plan() {
        let mut tools = ToolBox::new();
        tools.add(MultiplyTool);
        let context = ctx(
            vec![Message::user("Multiply 12 by 7, then divide by 4")],
            tools,
        );
        let result = plan(&context);
        assert_eq!(result.strategy, "iterative");
        assert_eq!(result.steps.len(), 3);
    }

    #[test]
    fn adapt_to_completion_on_success() {
        let context = ctx(vec![Message::user("hi")], ToolBox::new());
        let initial = plan(&context);
        let step_result = StepResult {
            is_complete: true,
            ..StepResult::default()
        };
        let adapted = adapt(initial, &step_result, &context);
        assert_eq!(adapted.strategy, "completion");
    }

    #[test]
    fn adapt_drains_pending_tool_calls() {
        let mut tools = ToolBox::new();
        tools.add(MultiplyTool);
        let call = crate::message::ToolCall {
            id: "call_1".to_string(),
            name: "multiply".to_string(),
            arguments: serde_json::json!({"a": 12, "b": 7}),
        };
        let context = ctx(
            vec![Message::user("go"), Message::assistant_tool_calls(vec![call])],
            tools,
        );
        let initial = plan(&context);
        let step_result = StepResult::message(
            context.messages().last().unwrap().clone(),
            crate::metrics::Metrics::default(),
            None,
        );
        let adapted = adapt(initial, &step_result, &context);
        assert_eq!(adapted.steps.len(), 2);
    }
}
