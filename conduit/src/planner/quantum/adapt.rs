//! Tree-of-thoughts self-healing: how a quantum [`Plan`] reacts to an
//! executor error without the agent loop having to know the planner flavor.

use crate::context::AgentContext;
use crate::plan::{Plan, PlanStep, Priority, QuantumMeta, StepResult, StepType};

const ERROR_CONFIDENCE_DECAY: f64 = 0.9;
const SIMPLE_RECOVERY_CONFIDENCE: f64 = 60.0;

/// Adapts `plan` after one executor step.
///
/// Completion and the plain "pop the head and continue" case behave exactly
/// like the heuristic planner's adaptation. An error instead triggers a
/// revision: the highest-reliability sibling from `plan.quantum.alternatives`
/// is promoted to the active plan with its confidence reduced, or, if no
/// usable alternative survives, a single-step recovery plan at a fixed,
/// reduced confidence.
#[must_use]
pub fn adapt_quantum_plan(plan: Plan, step_result: &StepResult, _ctx: &AgentContext) -> Plan {
    if step_result.is_complete {
        return Plan::completion();
    }
    if step_result.error.is_some() {
        return revise_on_error(&plan);
    }

    let mut steps = plan.steps;
    steps.pop_front();
    let estimated_cost = steps.len() as f64;
    Plan {
        steps,
        estimated_cost,
        ..plan
    }
}

fn revise_on_error(plan: &Plan) -> Plan {
    let Some(meta) = plan.quantum.clone() else {
        return simple_recovery();
    };

    let best = meta
        .alternatives
        .iter()
        .filter(|a| !a.steps.is_empty())
        .max_by(|a, b| a.reliability.total_cmp(&b.reliability));

    let Some(best) = best else {
        return simple_recovery();
    };

    let confidence = (meta.confidence * ERROR_CONFIDENCE_DECAY).max(0.0);
    Plan {
        steps: best.steps.clone().into(),
        strategy: "error_recovery".to_string(),
        estimated_cost: best.steps.len() as f64,
        quantum: Some(QuantumMeta {
            strategy_reasoning: format!("revised after error, adopting alternative '{}'", best.label),
            confidence,
            ..meta
        }),
    }
}

fn simple_recovery() -> Plan {
    let mut plan = Plan::new("recovery", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
    plan.quantum = Some(QuantumMeta {
        strategy_reasoning: "no usable alternative survived revision, falling back to a plain retry".to_string(),
        confidence: SIMPLE_RECOVERY_CONFIDENCE,
        ..QuantumMeta::default()
    });
    plan
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::message::Message;
    use crate::metrics::Metrics;
    use crate::options::Options;
    use crate::plan::Alternative;
    use crate::providers::ProviderPool;
    use crate::tool::ToolBox;

    fn ctx() -> AgentContext {
        AgentContext::new(
            vec![Message::user("go")],
            Arc::new(ToolBox::new()),
            Arc::new(ProviderPool::new(Vec::new(), Vec::new(), Default::default(), Default::default())),
            Arc::new(Options::default()),
        )
    }

    #[test]
    fn completion_wins_over_everything() {
        let plan = Plan::new("direct", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
        let result = StepResult {
            is_complete: true,
            ..StepResult::default()
        };
        let adapted = adapt_quantum_plan(plan, &result, &ctx());
        assert_eq!(adapted.strategy, "completion");
    }

    #[test]
    fn error_promotes_best_alternative_with_decayed_confidence() {
        let mut plan = Plan::new("direct", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
        plan.quantum = Some(QuantumMeta {
            intent_summary: "test".to_string(),
            strategy_reasoning: "initial".to_string(),
            alternatives: vec![
                Alternative {
                    label: "weak".to_string(),
                    steps: vec![PlanStep::new(StepType::Chat, Priority::Critical)],
                    reliability: 0.4,
                },
                Alternative {
                    label: "strong".to_string(),
                    steps: vec![
                        PlanStep::new(StepType::Chat, Priority::Critical),
                        PlanStep::new(StepType::ToolExecution, Priority::Critical),
                    ],
                    reliability: 0.9,
                },
            ],
            confidence: 85.0,
        });
        let result = StepResult::failed("boom", Metrics::default());
        let adapted = adapt_quantum_plan(plan, &result, &ctx());
        assert_eq!(adapted.strategy, "error_recovery");
        assert_eq!(adapted.steps.len(), 2);
        let meta = adapted.quantum.unwrap();
        assert!((meta.confidence - 76.5).abs() < 1e-9);
    }

    #[test]
    fn error_with_no_quantum_meta_falls_back_to_simple_recovery() {
        let plan = Plan::new("direct", vec![PlanStep::new(StepType::Chat, Priority::Critical)]);
        let result = StepResult::failed("boom", Metrics::default());
        let adapted = adapt_quantum_plan(plan, &result, &ctx());
        assert_eq!(adapted.strategy, "recovery");
        assert_eq!(adapted.quantum.unwrap().confidence, SIMPLE_RECOVERY_CONFIDENCE);
    }

    #[test]
    fn non_terminal_success_drops_the_head() {
        let plan = Plan::new(
            "direct",
            vec![
                PlanStep::new(StepType::Chat, Priority::Critical),
                PlanStep::new(StepType::Chat, Priority::Normal),
            ],
        );
        let result = StepResult::message(Message::assistant("partial"), Metrics::default(), None);
        let adapted = adapt_quantum_plan(plan, &result, &ctx());
        assert_eq!(adapted.steps.len(), 1);
    }
}
