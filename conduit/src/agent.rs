//! The plan -> execute -> reflect -> adapt loop that drives one run to
//! completion, plus the public entry points.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::executor;
use crate::message::Message;
use crate::metrics::Metrics;
use crate::options::{Options, PlannerKind};
use crate::plan::{Plan, PlanStep, Priority, ProviderUsed, QuantumMeta, StepResult, StepType};
use crate::planner::{heuristic, quantum};
use crate::providers::{CircuitBreaker, Provider, ProviderPool};
use crate::reflector::{self, Reflection};
use crate::tool::ToolBox;

/// More than this many *consecutive* step errors trips the safety valve.
const REPEATED_FAILURE_THRESHOLD: u32 = 2;
/// Confidence multiplier applied when the loop switches to the best
/// surviving alternative after repeated errors.
const ALTERNATIVE_SWITCH_DECAY: f64 = 0.8;

/// One executed step's record, kept only when [`Options::debug`] is set.
#[derive(Debug, Clone)]
pub struct DebugStep {
    /// Strategy tag of the plan this step was popped from.
    pub plan_strategy: String,
    /// What kind of step this was.
    pub step_type: StepType,
    /// The executor's raw result.
    pub result: StepResult,
    /// The reflector's verdict, if it ran.
    pub reflection: Option<Reflection>,
}

/// Extra history recorded only when [`Options::debug`] is enabled.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// Every step executed, in order.
    pub steps: Vec<DebugStep>,
    /// Every provider call attempted, in order, across the whole run.
    pub provider_history: Vec<ProviderUsed>,
}

/// The result of one `run()` call.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The full conversation, including whatever pruning removed from the
    /// middle.
    pub messages: Vec<Message>,
    /// Accumulated counters for the whole run.
    pub metrics: Metrics,
    /// Present only when [`Options::debug`] was set.
    pub debug: Option<DebugInfo>,
    /// Set when the run terminated on cancellation or the repeated-failure
    /// safety valve; absent on success or plain budget exhaustion.
    pub error: Option<String>,
}

/// Runs the agent loop to completion, budget exhaustion, or fatal failure.
///
/// Picks the planner flavor from `options.planner` and drives
/// plan -> execute -> reflect -> adapt until the plan is empty, the step
/// budget is spent, or the run is cancelled.
pub async fn run(messages: Vec<Message>, tools: ToolBox, providers: ProviderPool, options: Options) -> RunResult {
    run_cancellable(messages, tools, providers, options, CancelToken::new()).await
}

/// As [`run`], but accepts an external [`CancelToken`] the caller can trip
/// mid-run.
pub async fn run_cancellable(
    messages: Vec<Message>,
    tools: ToolBox,
    providers: ProviderPool,
    options: Options,
    cancel: CancelToken,
) -> RunResult {
    let started_at = Instant::now();
    let debug_enabled = options.debug;
    let mut debug = debug_enabled.then(DebugInfo::default);
    let mut ctx = AgentContext::new(messages, Arc::new(tools), Arc::new(providers), Arc::new(options));

    let mut plan = build_plan(&ctx, &cancel).await;
    let mut consecutive_errors = 0u32;
    let mut switched_alternative = false;

    while ctx.state().step_count < ctx.options().max_steps && !ctx.state().is_complete && !plan.is_empty() {
        if cancel.is_cancelled() {
            return finish(ctx, debug, Some(AgentError::Cancelled.to_string()), started_at);
        }

        if ctx.options().planner == PlannerKind::Quantum {
            plan = insert_tool_drain_if_needed(plan, &ctx);
        }

        let step = plan.steps[0].clone();
        let result = executor::execute(&step, &ctx, &cancel).await;

        ctx = ctx.append_messages(result.delta.clone());
        ctx = ctx.update_metrics(result.metrics);
        ctx = ctx.update_state(result.is_complete, result.error.clone());

        if result.fatal {
            warn!(error = ?result.error, "agent loop: aborting run on fatal provider error");
            if let Some(d) = &mut debug {
                d.steps.push(DebugStep {
                    plan_strategy: plan.strategy.clone(),
                    step_type: step.step_type,
                    result: result.clone(),
                    reflection: None,
                });
            }
            return finish(ctx, debug, result.error.clone(), started_at);
        }

        let mut reflection = None;
        if result.error.is_none() && !result.is_complete {
            reflection = reflector::review(&result, &ctx);
            if let Some(r) = reflection.as_ref().filter(|r| r.should_retry) {
                if let Some(corrected) = r.corrected_message.clone() {
                    ctx = ctx.replace_last_message(corrected);
                }
            }
        }

        if let Some(used) = &result.provider_used {
            if let Some(d) = &mut debug {
                d.provider_history.push(used.clone());
            }
        }

        consecutive_errors = if result.error.is_some() { consecutive_errors + 1 } else { 0 };

        if let Some(d) = &mut debug {
            d.steps.push(DebugStep {
                plan_strategy: plan.strategy.clone(),
                step_type: step.step_type,
                result: result.clone(),
                reflection,
            });
        }

        plan = adapt_plan(plan, &result, &ctx);

        if ctx.options().planner == PlannerKind::Quantum
            && consecutive_errors > REPEATED_FAILURE_THRESHOLD
            && !switched_alternative
        {
            info!("agent loop: switching to best surviving alternative after repeated errors");
            plan = switch_to_best_alternative(plan);
            switched_alternative = true;
        }

        if result.error.is_some() && consecutive_errors > REPEATED_FAILURE_THRESHOLD {
            warn!(consecutive_errors, "agent loop: repeated failure safety valve tripped");
            let last_message = result.error.clone().unwrap_or_default();
            let error = AgentError::RepeatedFailure {
                consecutive: consecutive_errors,
                last_message,
            };
            return finish(ctx, debug, Some(error.to_string()), started_at);
        }
    }

    finish(ctx, debug, None, started_at)
}

/// Legacy compatibility entry point: a flat provider list (classified into
/// primary/fallback by the `"free"`/`"google"` convention) and either a bare
/// step budget or a full [`Options`], returning only the final messages.
pub async fn run_legacy(
    messages: Vec<Message>,
    providers: Vec<Arc<dyn Provider>>,
    tools: ToolBox,
    budget: impl Into<StepBudget>,
    models: HashMap<String, String>,
) -> Vec<Message> {
    let options = match budget.into() {
        StepBudget::Steps(max_steps) => Options::default().with_max_steps(max_steps),
        StepBudget::Options(options) => options,
    };
    let pool = ProviderPool::from_flat(providers, models, CircuitBreaker::default());
    run(messages, tools, pool, options).await.messages
}

/// The legacy entry point's step-budget parameter: either a bare integer or
/// a full options record.
pub enum StepBudget {
    /// A bare `maxSteps` integer; everything else defaults.
    Steps(u32),
    /// A fully specified options record.
    Options(Options),
}

impl From<u32> for StepBudget {
    fn from(max_steps: u32) -> Self {
        Self::Steps(max_steps)
    }
}

impl From<Options> for StepBudget {
    fn from(options: Options) -> Self {
        Self::Options(options)
    }
}

async fn build_plan(ctx: &AgentContext, cancel: &CancelToken) -> Plan {
    match ctx.options().planner {
        PlannerKind::Heuristic => heuristic::plan(ctx),
        PlannerKind::Quantum => quantum::plan(ctx, cancel).await,
    }
}

fn adapt_plan(plan: Plan, result: &StepResult, ctx: &AgentContext) -> Plan {
    match ctx.options().planner {
        PlannerKind::Heuristic => heuristic::adapt(plan, result, ctx),
        PlannerKind::Quantum => quantum::adapt(plan, result, ctx),
    }
}

/// Quantum-only: if the last context message still carries unresolved
/// tool-calls and the plan's head is not already a tool-execution step,
/// inserts one so the loop never starves on a pending tool call.
fn insert_tool_drain_if_needed(mut plan: Plan, ctx: &AgentContext) -> Plan {
    let has_unresolved = ctx.messages().last().is_some_and(Message::has_tool_calls);
    let head_is_drain = plan.steps.front().is_some_and(|s| s.step_type == StepType::ToolExecution);
    if has_unresolved && !head_is_drain {
        plan.steps.push_front(PlanStep::new(StepType::ToolExecution, Priority::Critical));
        plan.estimated_cost = plan.steps.len() as f64;
    }
    plan
}

/// Quantum-only: promotes the highest-reliability alternative to the active
/// plan, reducing overall confidence by 20%. A no-op if the plan carries no
/// quantum metadata or no usable alternative.
fn switch_to_best_alternative(plan: Plan) -> Plan {
    let Some(meta) = plan.quantum.clone() else { return plan };
    let best = meta
        .alternatives
        .iter()
        .filter(|a| !a.steps.is_empty())
        .max_by(|a, b| a.reliability.total_cmp(&b.reliability))
        .cloned();
    let Some(best) = best else { return plan };

    Plan {
        steps: best.steps.clone().into(),
        strategy: format!("alternative:{}", best.label),
        estimated_cost: best.steps.len() as f64,
        quantum: Some(QuantumMeta {
            confidence: (meta.confidence * ALTERNATIVE_SWITCH_DECAY).max(0.0),
            ..meta
        }),
    }
}

fn finish(ctx: AgentContext, debug: Option<DebugInfo>, error: Option<String>, started_at: Instant) -> RunResult {
    let mut metrics = ctx.state().metrics;
    metrics.duration = started_at.elapsed();
    RunResult {
        messages: ctx.messages().to_vec(),
        metrics,
        debug,
        error: error.or_else(|| ctx.state().last_error.clone()),
    }
}
