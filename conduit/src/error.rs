//! The engine's error taxonomy.
//!
//! Only conditions that cannot be recovered by the engine itself — no
//! providers configured, an explicit cancellation, an invariant violation —
//! surface as an [`AgentError`]. Provider failures are recovered by failover;
//! tool failures are recovered conversationally (see [`crate::tool::ToolError`]
//! and the `tool`-role error messages it produces).

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Everything that can terminate a run early, or report a malformed input.
#[derive(Debug)]
#[non_exhaustive]
pub enum AgentError {
    /// A provider call failed in a way that does not recover via failover
    /// (e.g. missing credentials detected at construction time).
    ProviderFatal {
        /// Id of the offending provider.
        provider: String,
        /// Human-readable detail.
        message: String,
    },
    /// Every configured provider (primary and fallback) failed for one step.
    AllProvidersFailed {
        /// Ids of the providers that were attempted, in attempt order.
        attempted: Vec<String>,
        /// Detail from the last failure observed.
        last_message: String,
    },
    /// No providers were registered for the run.
    NoProviders,
    /// More than two consecutive steps produced an error; the loop gave up.
    RepeatedFailure {
        /// Number of consecutive failing steps observed.
        consecutive: u32,
        /// Detail from the last failure.
        last_message: String,
    },
    /// The run was cancelled via its [`crate::cancel::CancelToken`].
    Cancelled,
    /// A JSON encode/decode failure outside the tool-call pipeline.
    Json {
        /// Human-readable detail.
        message: String,
    },
    /// Anything else that does not fit the taxonomy above.
    Internal {
        /// Human-readable detail.
        message: String,
    },
}

impl AgentError {
    /// Builds a [`AgentError::ProviderFatal`].
    pub fn provider_fatal(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderFatal {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Builds a [`AgentError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that indicate the caller should not retry the run
    /// with the same configuration (fatal/no-providers), as opposed to
    /// transient conditions a retry could plausibly clear.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ProviderFatal { .. } | Self::NoProviders)
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderFatal { provider, message } => {
                write!(f, "provider '{provider}' failed fatally: {message}")
            }
            Self::AllProvidersFailed {
                attempted,
                last_message,
            } => write!(
                f,
                "all providers failed ({}): {last_message}",
                attempted.join(", ")
            ),
            Self::NoProviders => write!(f, "no providers configured for this run"),
            Self::RepeatedFailure {
                consecutive,
                last_message,
            } => write!(f, "{consecutive} consecutive step failures: {last_message}"),
            Self::Cancelled => write!(f, "run cancelled"),
            Self::Json { message } => write!(f, "json error: {message}"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}
