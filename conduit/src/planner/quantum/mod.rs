//! Hierarchical task-network planner with tree-of-thoughts alternatives and
//! self-healing adaptation.
//!
//! Three phases build the initial plan: [`intent::recognize_intent`] (Phase
//! A), [`strategy::select_strategy`] plus [`strategy::decompose`] (Phase B),
//! and [`alternatives::generate_alternatives`] (Phase C). [`adapt::adapt_quantum_plan`]
//! then drives revision after every executor step.

mod adapt;
mod alternatives;
mod intent;
mod strategy;

use crate::cancel::CancelToken;
use crate::context::AgentContext;
use crate::message::Role;
use crate::plan::{Plan, QuantumMeta, StepResult};

pub use adapt::adapt_quantum_plan;
pub use intent::{Complexity, Intent, TaskType};
pub use strategy::StrategyType;

const BASELINE_CONFIDENCE: f64 = 85.0;
const DEGRADED_CONFIDENCE: f64 = 70.0;

/// Builds the initial [`Plan`] for the current context by running all three
/// phases, per the module docs.
pub async fn plan(ctx: &AgentContext, cancel: &CancelToken) -> Plan {
    let Some(last) = ctx.messages().last() else {
        return Plan::completion();
    };
    if last.role != Role::User {
        return Plan::completion();
    }
    let text = last.content.clone().unwrap_or_default();

    let intent = intent::recognize_intent(ctx, cancel).await;
    let (strategy_type, reasoning) = strategy::select_strategy(&intent, &text);
    let tools = strategy::predict_tools(&intent, &text, ctx);
    let steps = strategy::decompose(strategy_type, &text, &tools);
    let alternatives = alternatives::generate_alternatives(&tools);

    let confidence = if intent.degraded { DEGRADED_CONFIDENCE } else { BASELINE_CONFIDENCE };

    let mut built = Plan::new(strategy_type.as_str(), steps);
    built.quantum = Some(QuantumMeta {
        intent_summary: intent.primary,
        strategy_reasoning: reasoning,
        alternatives,
        confidence,
    });
    built
}

/// Adapts `plan` after one executor step. See [`adapt_quantum_plan`].
#[must_use]
pub fn adapt(plan: Plan, step_result: &StepResult, ctx: &AgentContext) -> Plan {
    adapt_quantum_plan(plan, step_result, ctx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::message::Message;
    use crate::options::Options;
    use crate::providers::{ChatResult, FinishReason, Provider, ProviderPool};
    use crate::tool::ToolBox;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn id(&self) -> &str {
            "stub"
        }

        fn supports_tools(&self) -> bool {
            false
        }

        async fn chat(
            &self,
            _model: &str,
            messages: &[Message],
            _tools: Option<&[crate::tool::ToolDefinition]>,
            _timeout: Duration,
            _cancel: &CancelToken,
        ) -> Result<ChatResult> {
            let mut out = messages.to_vec();
            out.push(Message::assistant(self.reply.clone()));
            Ok(ChatResult {
                messages: out,
                finish_reason: FinishReason::Stop,
                usage: None,
            })
        }
    }

    fn ctx_with_provider(reply: &str) -> AgentContext {
        let provider: Arc<dyn Provider> = Arc::new(StubProvider { reply: reply.to_string() });
        AgentContext::new(
            vec![Message::user("Multiply 12 by 7, then divide by 4")],
            Arc::new(ToolBox::new()),
            Arc::new(ProviderPool::new(vec![provider], Vec::new(), Default::default(), Default::default())),
            Arc::new(Options::default()),
        )
    }

    #[tokio::test]
    async fn builds_sequential_plan_from_structured_intent_reply() {
        let reply = "PRIMARY_INTENT: multiply then divide\nSECONDARY_INTENTS: none\nCONTEXT: arithmetic\n\
                     COMPLEXITY: moderate\nTASK_TYPE: calculation\nCONSTRAINTS: none";
        let context = ctx_with_provider(reply);
        let cancel = CancelToken::new();
        let built = plan(&context, &cancel).await;
        assert_eq!(built.strategy, "sequential");
        let meta = built.quantum.unwrap();
        assert_eq!(meta.confidence, BASELINE_CONFIDENCE);
        assert!(meta.alternatives.len() >= 2);
    }

    #[tokio::test]
    async fn falls_back_to_keyword_classifier_on_unparsable_reply() {
        let context = ctx_with_provider("I cannot comply with that format.");
        let cancel = CancelToken::new();
        let built = plan(&context, &cancel).await;
        let meta = built.quantum.unwrap();
        assert_eq!(meta.confidence, DEGRADED_CONFIDENCE);
    }

    #[tokio::test]
    async fn non_user_turn_yields_completion() {
        let provider: Arc<dyn Provider> = Arc::new(StubProvider { reply: String::new() });
        let context = AgentContext::new(
            vec![Message::system("sys")],
            Arc::new(ToolBox::new()),
            Arc::new(ProviderPool::new(vec![provider], Vec::new(), Default::default(), Default::default())),
            Arc::new(Options::default()),
        );
        let cancel = CancelToken::new();
        let built = plan(&context, &cancel).await;
        assert_eq!(built.strategy, "completion");
    }
}
