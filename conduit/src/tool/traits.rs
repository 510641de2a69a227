//! The typed [`Tool`] trait and its object-safe, JSON-at-the-boundary
//! counterpart [`ToolDyn`] used by the registry and executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::definition::ToolDefinition;

/// Failure modes visible to the engine when dispatching a tool call.
///
/// These surface to the model as `role: tool` error messages (see
/// `crate::error` for the run-terminating taxonomy, which this is not part
/// of: a failing tool never aborts a run).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ToolError {
    /// No tool is registered under this name.
    NotFound(String),
    /// The provider-supplied arguments did not match the tool's schema.
    InvalidArguments(String),
    /// The tool's own logic failed.
    Execution(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "Tool '{name}' not found"),
            Self::InvalidArguments(detail) => write!(f, "invalid arguments: {detail}"),
            Self::Execution(detail) => write!(f, "{detail}"),
        }
    }
}

impl std::error::Error for ToolError {}

/// A strongly-typed callable capability.
///
/// Implement this directly, or generate an implementation with
/// `#[conduit_derive::tool]` on a plain function.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the model uses to invoke this tool. Must be unique within
    /// a [`super::registry::ToolBox`].
    const NAME: &'static str;

    /// Deserialized argument type.
    type Args: DeserializeOwned + Send;
    /// Return type, serialized back to the model as the tool-role message
    /// content.
    type Output: Serialize + Send;
    /// Error type surfaced as [`ToolError::Execution`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns [`Self::NAME`]. Override only if a tool's name must be
    /// computed rather than constant.
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Model-facing description of what the tool does.
    fn description(&self) -> String;

    /// JSON-schema describing [`Self::Args`].
    fn parameters_schema(&self) -> Value;

    /// Assembles the full [`ToolDefinition`] from the other methods.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description(),
            parameters: self.parameters_schema(),
        }
    }

    /// Executes the tool.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe view of a [`Tool`], operating on raw JSON at the boundary so
/// heterogeneous tools can share one registry.
pub trait ToolDyn: Send + Sync {
    /// See [`Tool::name`].
    fn name(&self) -> &str;
    /// See [`Tool::definition`].
    fn definition(&self) -> ToolDefinition;
    /// Deserializes `args`, calls the tool, and serializes the result back
    /// to JSON, mapping every failure mode into [`ToolError`].
    fn call_json<'a>(&'a self, args: Value) -> BoxFuture<'a, Result<Value, ToolError>>;
}

impl<T> ToolDyn for T
where
    T: Tool,
{
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    fn call_json<'a>(&'a self, args: Value) -> BoxFuture<'a, Result<Value, ToolError>> {
        Box::pin(async move {
            let args: T::Args = serde_json::from_value(args)
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
            let output = self
                .call(args)
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            serde_json::to_value(output).map_err(|e| ToolError::InvalidArguments(e.to_string()))
        })
    }
}

/// A type-erased, shareable tool handle stored in a registry.
pub type BoxedTool = Box<dyn ToolDyn>;
