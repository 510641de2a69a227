//! The provider interface the executor consumes.

use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolDefinition;
use crate::usage::TokenUsage;

/// Why a provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The model produced a complete reply with no pending tool calls.
    Stop,
    /// The model requested one or more tool calls.
    ToolCall,
    /// The model hit its output-length limit.
    Length,
    /// The provider reported an error condition inline (not a transport
    /// failure, which is instead surfaced as an `Err` from `chat`).
    Error,
}

/// One provider response.
#[derive(Debug, Clone)]
pub struct ChatResult {
    /// The full message list: the input plus the appended assistant turn.
    pub messages: Vec<Message>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// Token accounting, when the provider reports it.
    pub usage: Option<TokenUsage>,
}

impl ChatResult {
    /// The assistant turn this result appended, if any.
    #[must_use]
    pub fn assistant_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// A model backend.
///
/// Implementations own their own transport and retry-at-the-transport-level
/// concerns; the engine's retry/fallback/circuit-breaking operates one level
/// up, across provider instances.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier, used for circuit-breaker bookkeeping, metrics, and
    /// debug history (e.g. `"openai"`, `"groq-free"`).
    fn id(&self) -> &str;

    /// True if this provider can receive structured tool-call requests and
    /// emit structured tool-call responses. False means the engine must use
    /// the text-embedded tool-call convention (see `crate::tool::parser`).
    fn supports_tools(&self) -> bool;

    /// Generates the next assistant turn.
    ///
    /// `tools` is only ever `Some` when [`Self::supports_tools`] is true.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::error::AgentError`] on transport failure, timeout,
    /// or a malformed response. Errors from this method are transient from
    /// the executor's point of view: they drive failover and circuit-breaker
    /// accounting rather than aborting the run.
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ChatResult>;
}
