//! Shared plan/step/result types consumed by both planners and the executor.

use std::collections::VecDeque;

use crate::message::Message;
use crate::metrics::Metrics;

/// The kind of work one [`PlanStep`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// Drive one provider turn.
    Chat,
    /// Dispatch the pending tool calls on the last assistant message.
    ToolExecution,
    /// A heuristic post-hoc review of the last assistant message.
    Reflection,
    /// The run is done; nothing left to execute.
    Completion,
    /// A synthetic chat turn used by the quantum planner's intent/strategy
    /// phases (a distinct tag so the planner can recognize and skip past
    /// its own scaffolding turns when adapting).
    Planning,
}

/// How urgently a step must run before the plan can be abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Must run; an error here halts the plan.
    Critical,
    /// Expected to run as part of the normal flow.
    Normal,
    /// May be dropped without affecting correctness.
    Optional,
}

/// One unit of work for the executor.
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// What kind of work this is.
    pub step_type: StepType,
    /// A synthetic user turn to inject before executing (used by planning
    /// and reflection steps).
    pub seed: Option<String>,
    /// Tool names this step is expected to exercise, if known in advance.
    pub expected_tools: Vec<String>,
    /// Urgency of this step.
    pub priority: Priority,
    /// Indices, within the owning plan's alternative step list, of steps
    /// that must complete before this one. Informational for the default
    /// executor (which runs steps strictly in order); consumed by callers
    /// that schedule independent steps concurrently.
    pub dependencies: Vec<usize>,
}

impl PlanStep {
    /// Builds a plain step with no seed, expected tools, or dependencies.
    #[must_use]
    pub fn new(step_type: StepType, priority: Priority) -> Self {
        Self {
            step_type,
            seed: None,
            expected_tools: Vec::new(),
            priority,
            dependencies: Vec::new(),
        }
    }

    /// Sets the expected tool names.
    #[must_use]
    pub fn with_expected_tools(mut self, tools: Vec<String>) -> Self {
        self.expected_tools = tools;
        self
    }

    /// Sets the seed text injected as a synthetic user turn.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }
}

/// A ranked sibling plan generated during tree-of-thoughts exploration.
#[derive(Debug, Clone)]
pub struct Alternative {
    /// Short label identifying the hypothesis (e.g. `"tool_focused"`).
    pub label: String,
    /// The steps this alternative would execute.
    pub steps: Vec<PlanStep>,
    /// Estimated reliability in `[0, 1]`.
    pub reliability: f64,
}

/// Extra metadata the quantum planner attaches to a [`Plan`].
#[derive(Debug, Clone, Default)]
pub struct QuantumMeta {
    /// Short description of the recognized intent.
    pub intent_summary: String,
    /// Why this strategy was chosen.
    pub strategy_reasoning: String,
    /// Ranked sibling plans, most reliable last (the fixed-fallback
    /// alternative is always appended last with reliability 0.9).
    pub alternatives: Vec<Alternative>,
    /// Overall plan confidence in `[0, 100]`.
    pub confidence: f64,
}

/// An ordered sequence of steps, recomputed after every executor call.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Steps to execute, in order.
    pub steps: VecDeque<PlanStep>,
    /// Short tag describing the planning strategy (e.g. `"iterative"`,
    /// `"sequential"`, `"hierarchical"`).
    pub strategy: String,
    /// Heuristic cost estimate (currently: step count).
    pub estimated_cost: f64,
    /// Present only for plans produced by the quantum planner.
    pub quantum: Option<QuantumMeta>,
}

impl Plan {
    /// Builds a plan from a step list, with a flat cost estimate.
    #[must_use]
    pub fn new(strategy: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        let estimated_cost = steps.len() as f64;
        Self {
            steps: steps.into(),
            strategy: strategy.into(),
            estimated_cost,
            quantum: None,
        }
    }

    /// A plan with a single [`StepType::Completion`] step.
    #[must_use]
    pub fn completion() -> Self {
        Self::new("completion", vec![PlanStep::new(StepType::Completion, Priority::Critical)])
    }

    /// True if no steps remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Provider used to produce a [`StepResult`], recorded for debug history.
#[derive(Debug, Clone)]
pub struct ProviderUsed {
    /// Provider id.
    pub id: String,
    /// Model name used for the call.
    pub model: String,
}

/// The outcome of executing one [`PlanStep`].
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    /// Messages appended by this step, in order.
    pub delta: Vec<Message>,
    /// True if the conversation is now finished.
    pub is_complete: bool,
    /// Metrics this step contributed.
    pub metrics: Metrics,
    /// Set when the step failed; the run continues unless the safety valve
    /// trips (see `crate::agent`).
    pub error: Option<String>,
    /// Set when `error` is a configuration/fatal error (see
    /// `AgentError::is_configuration_error`) that must abort the run
    /// immediately rather than enter the usual retry/adapt path.
    pub fatal: bool,
    /// The provider that produced the result, when this was a chat step.
    pub provider_used: Option<ProviderUsed>,
}

impl StepResult {
    /// Builds a successful, non-terminal result from a single delta message.
    #[must_use]
    pub fn message(message: Message, metrics: Metrics, provider_used: Option<ProviderUsed>) -> Self {
        Self {
            delta: vec![message],
            is_complete: false,
            metrics,
            error: None,
            fatal: false,
            provider_used,
        }
    }

    /// Builds an error result with no delta.
    #[must_use]
    pub fn failed(error: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            delta: Vec::new(),
            is_complete: false,
            metrics,
            error: Some(error.into()),
            fatal: false,
            provider_used: None,
        }
    }

    /// Builds a fatal error result with no delta: the agent loop must abort
    /// the run immediately rather than retry or adapt around it.
    #[must_use]
    pub fn fatal(error: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            delta: Vec::new(),
            is_complete: false,
            metrics,
            error: Some(error.into()),
            fatal: true,
            provider_used: None,
        }
    }
}
