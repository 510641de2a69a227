//! An agentic conversation runtime: given a conversation, a set of callable
//! tools, and a pool of heterogeneous model backends, drives the
//! conversation to completion by alternating model inferences and tool
//! executions under a step budget, with provider failover and
//! circuit-breaking.
//!
//! The entry points are [`run`] (full control, structured result) and
//! [`run_legacy`] (flat provider list, bare message-list result, for callers
//! migrating off an older integration). Everything else — [`AgentContext`],
//! the two planner flavors under [`planner`], [`executor`], and
//! [`reflector`] — is exposed for callers who want to drive the loop
//! themselves or inspect intermediate state.

mod agent;
mod cancel;
mod classifiers;
mod context;
mod error;
mod executor;
mod message;
mod metrics;
mod options;
mod plan;
mod planner;
mod providers;
mod reflector;
pub mod tool;
mod usage;

pub use agent::{run, run_cancellable, run_legacy, DebugInfo, DebugStep, RunResult, StepBudget};
pub use cancel::CancelToken;
pub use context::{AgentContext, RunState};
pub use error::{AgentError, Result};
pub use message::{Message, Role, ToolCall};
pub use metrics::{estimate_cost_savings, Metrics};
pub use options::{Options, PlannerKind, ProviderStrategy, RetryConfig};
pub use plan::{Alternative, Plan, PlanStep, Priority, ProviderUsed, QuantumMeta, StepResult, StepType};
pub use planner::{heuristic, quantum};
pub use providers::{ChatResult, CircuitBreaker, FinishReason, Provider, ProviderPool};
pub use reflector::{review, Reflection};
pub use tool::{BoxedTool, ParsedToolCall, Tool, ToolBox, ToolDefinition, ToolDyn, ToolError};
pub use usage::TokenUsage;

#[cfg(feature = "derive")]
pub use conduit_derive::tool;

/// Re-exported so `#[conduit::tool]`-generated code can name
/// `::conduit::async_trait::async_trait` without the caller depending on
/// `async-trait` directly.
pub use async_trait;

/// Re-exports of the most commonly needed names for a `use conduit::prelude::*;`.
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::context::AgentContext;
    pub use crate::error::{AgentError, Result};
    pub use crate::message::{Message, Role, ToolCall};
    pub use crate::options::{Options, PlannerKind, ProviderStrategy};
    pub use crate::providers::{ChatResult, FinishReason, Provider, ProviderPool};
    pub use crate::tool::{Tool, ToolBox, ToolDefinition, ToolError};
    pub use crate::{run, run_legacy, RunResult};
}
