//! The schema a tool advertises to providers and to the planner.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description, and JSON-schema parameters of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name the model uses to invoke the tool.
    pub name: String,
    /// Human/model-facing description of what the tool does.
    pub description: String,
    /// JSON-schema describing the tool's arguments.
    pub parameters: Value,
}
