//! Drives one [`PlanStep`] to a [`StepResult`]: either a chat turn (dispatched
//! across the provider pool per the configured strategy) or a batch of tool
//! dispatches.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::metrics::{estimate_cost_savings, Metrics};
use crate::options::{ProviderStrategy, RetryConfig};
use crate::plan::{PlanStep, ProviderUsed, StepResult, StepType};
use crate::providers::{FinishReason, Provider};
use crate::tool::{parse_text_tool_call, ToolError};

static TOOL_CALL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Executes a single plan step against the current context.
pub async fn execute(step: &PlanStep, ctx: &AgentContext, cancel: &CancelToken) -> StepResult {
    match step.step_type {
        StepType::Completion => StepResult {
            is_complete: true,
            ..StepResult::default()
        },
        StepType::ToolExecution => execute_tool_step(ctx, cancel).await,
        StepType::Chat | StepType::Planning | StepType::Reflection => {
            execute_chat_step(ctx, step.seed.as_deref(), cancel).await
        }
    }
}

async fn execute_chat_step(ctx: &AgentContext, seed: Option<&str>, cancel: &CancelToken) -> StepResult {
    let mut messages = ctx.messages().to_vec();
    if let Some(seed) = seed {
        messages.push(Message::user(seed.to_string()));
    }

    let strategy = ctx.options().provider_strategy;
    let pool = ctx.providers();

    if pool.is_empty() {
        return StepResult::fatal(AgentError::NoProviders.to_string(), Metrics::default());
    }

    let outcome = match strategy {
        ProviderStrategy::Smart => {
            let mut attempted = Vec::new();
            match call_sequential(pool.primary(), ctx, &messages, cancel, &mut attempted).await {
                Ok(Some(result)) => Ok((Some(result), attempted)),
                Ok(None) => {
                    let mut fallback_attempted = Vec::new();
                    let result = call_sequential(pool.fallback(), ctx, &messages, cancel, &mut fallback_attempted).await;
                    attempted.extend(fallback_attempted);
                    result.map(|r| (r, attempted))
                }
                Err(err) => Err(err),
            }
        }
        ProviderStrategy::Sequential => {
            let combined: Vec<_> = pool.primary().iter().chain(pool.fallback()).cloned().collect();
            let mut attempted = Vec::new();
            call_sequential(&combined, ctx, &messages, cancel, &mut attempted)
                .await
                .map(|r| (r, attempted))
        }
        ProviderStrategy::Racing => {
            let mut attempted = Vec::new();
            match call_racing(pool.primary(), ctx, &messages, cancel, &mut attempted).await {
                Ok(Some(result)) => Ok((Some(result), attempted)),
                Ok(None) => {
                    let mut fallback_attempted = Vec::new();
                    let result = call_sequential(pool.fallback(), ctx, &messages, cancel, &mut fallback_attempted).await;
                    attempted.extend(fallback_attempted);
                    result.map(|r| (r, attempted))
                }
                Err(err) => Err(err),
            }
        }
    };

    match outcome {
        Ok((Some(result), _attempted)) => result,
        Ok((None, attempted)) => StepResult::failed(
            format!("all providers failed: {}", attempted.join(", ")),
            Metrics {
                provider_calls: attempted.len() as u64,
                ..Metrics::default()
            },
        ),
        // A configuration/fatal error (e.g. a missing credential) aborts the
        // run immediately; it never enters the retry/fallback path.
        Err(err) => StepResult::fatal(err.to_string(), Metrics::default()),
    }
}

/// Tries each provider in order; returns the first success, recording
/// circuit-breaker outcomes and skipped/failed ids into `attempted`.
///
/// Between a failed attempt and the next, sleeps for
/// `options.retry.delay_for_attempt()` (interruptible by `cancel`), per the
/// documented backoff policy. A configuration/fatal error short-circuits
/// the whole sequence immediately, without trying the remaining providers.
async fn call_sequential(
    providers: &[Arc<dyn Provider>],
    ctx: &AgentContext,
    messages: &[Message],
    cancel: &CancelToken,
    attempted: &mut Vec<String>,
) -> Result<Option<StepResult>, AgentError> {
    let retry = ctx.options().retry;
    for (index, provider) in providers.iter().enumerate() {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if !ctx.providers().circuit_breaker().is_available(provider.id()) {
            info!(provider = provider.id(), "skipping provider, circuit open");
            continue;
        }
        match call_one(provider.as_ref(), ctx, messages, cancel).await {
            Ok(result) => return Ok(Some(result)),
            Err(err) if err.is_configuration_error() => {
                warn!(provider = provider.id(), error = %err, "provider failed fatally, aborting run");
                return Err(err);
            }
            Err(err) => {
                warn!(provider = provider.id(), error = %err, "provider call failed");
                ctx.providers().circuit_breaker().record_failure(provider.id());
                attempted.push(provider.id().to_string());
                if index + 1 < providers.len() {
                    backoff(&retry, cancel).await;
                }
            }
        }
    }
    Ok(None)
}

/// Sleeps for the configured retry delay before the next sequential
/// attempt, returning early if `cancel` fires mid-sleep.
async fn backoff(retry: &RetryConfig, cancel: &CancelToken) {
    let delay = retry.delay_for_attempt();
    tokio::select! {
        () = tokio::time::sleep(delay) => {}
        () = cancel.cancelled() => {}
    }
}

/// Races every available provider concurrently; the first success wins and
/// the rest are dropped (cancelling them). Losers are not counted in
/// metrics, matching the documented convention. A configuration/fatal error
/// short-circuits the race immediately.
async fn call_racing(
    providers: &[Arc<dyn Provider>],
    ctx: &AgentContext,
    messages: &[Message],
    cancel: &CancelToken,
    attempted: &mut Vec<String>,
) -> Result<Option<StepResult>, AgentError> {
    let available: Vec<_> = providers
        .iter()
        .filter(|p| ctx.providers().circuit_breaker().is_available(p.id()))
        .cloned()
        .collect();
    if available.is_empty() {
        return Ok(None);
    }

    let mut futures = FuturesUnordered::new();
    for provider in available {
        let messages = messages.to_vec();
        let cancel = cancel.clone();
        futures.push(async move {
            let result = call_one(provider.as_ref(), ctx, &messages, &cancel).await;
            (provider.id().to_string(), result)
        });
    }

    while let Some((id, result)) = futures.next().await {
        match result {
            Ok(step_result) => return Ok(Some(step_result)),
            Err(err) if err.is_configuration_error() => {
                warn!(provider = id, error = %err, "racing provider failed fatally, aborting run");
                return Err(err);
            }
            Err(err) => {
                warn!(provider = id, error = %err, "racing provider failed");
                ctx.providers().circuit_breaker().record_failure(&id);
                attempted.push(id);
            }
        }
    }
    Ok(None)
}

async fn call_one(
    provider: &dyn Provider,
    ctx: &AgentContext,
    messages: &[Message],
    cancel: &CancelToken,
) -> Result<StepResult, AgentError> {
    let tool_defs = provider.supports_tools().then(|| ctx.tools().definitions());
    let model = ctx.providers().model_for(provider.id()).to_string();

    let chat_result = provider
        .chat(
            &model,
            messages,
            tool_defs.as_deref(),
            ctx.options().timeout,
            cancel,
        )
        .await?;

    ctx.providers().circuit_breaker().record_success(provider.id());

    let total_tokens = chat_result.usage.map_or(0, |u| u.total());
    let mut metrics = Metrics {
        provider_calls: 1,
        cost_savings: estimate_cost_savings(provider.id(), total_tokens),
        ..Metrics::default()
    };

    let input_len = messages.len();
    let mut delta: Vec<Message> = chat_result.messages.into_iter().skip(input_len).collect();

    if !provider.supports_tools() {
        synthesize_text_tool_calls(&mut delta);
    }

    let is_complete = chat_result.finish_reason == FinishReason::Stop
        && !delta.last().is_some_and(Message::has_tool_calls);

    metrics.provider_calls = 1;
    Ok(StepResult {
        delta,
        is_complete,
        metrics,
        error: None,
        fatal: false,
        provider_used: Some(ProviderUsed {
            id: provider.id().to_string(),
            model,
        }),
    })
}

/// For providers that cannot emit structured tool-calls, recovers a request
/// embedded as `TOOL_CALL: {...}` text and attaches it to the message as if
/// it had arrived structured.
fn synthesize_text_tool_calls(delta: &mut [Message]) {
    let Some(last) = delta.last_mut() else { return };
    if last.has_tool_calls() {
        return;
    }
    let Some(content) = last.content.as_deref() else {
        return;
    };
    if let Some(parsed) = parse_text_tool_call(content) {
        let id = format!(
            "call_{}_{}",
            parsed.name,
            TOOL_CALL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        last.tool_calls = Some(vec![ToolCall {
            id,
            name: parsed.name,
            arguments: parsed.arguments,
        }]);
    }
}

async fn execute_tool_step(ctx: &AgentContext, cancel: &CancelToken) -> StepResult {
    let Some(calls) = ctx.messages().last().and_then(|m| m.tool_calls.clone()) else {
        return StepResult::failed("no pending tool calls", Metrics::default());
    };
    if calls.is_empty() {
        return StepResult::failed("no pending tool calls", Metrics::default());
    }

    let dispatches = calls.iter().map(|call| dispatch_one(ctx, call, cancel));
    let delta = join_all(dispatches).await;

    StepResult {
        delta,
        is_complete: false,
        metrics: Metrics {
            tool_executions: calls.len() as u64,
            ..Metrics::default()
        },
        error: None,
        fatal: false,
        provider_used: None,
    }
}

async fn dispatch_one(ctx: &AgentContext, call: &ToolCall, cancel: &CancelToken) -> Message {
    if cancel.is_cancelled() {
        return Message::tool_response(&call.id, &call.name, "Error: cancelled");
    }

    match ctx.tools().call(&call.name, call.arguments.clone()).await {
        Ok(value) => {
            let content = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
            Message::tool_response(&call.id, &call.name, content)
        }
        Err(ToolError::NotFound(name)) => {
            Message::tool_response(&call.id, &call.name, format!("Error: Tool '{name}' not found"))
        }
        Err(e) => Message::tool_response(&call.id, &call.name, format!("Error: {e}")),
    }
}
