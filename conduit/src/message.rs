//! Conversation messages and tool-call requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Carries persona/policy instructions; preserved across history pruning.
    System,
    /// A turn from the human (or calling application) side of the conversation.
    User,
    /// A model-produced turn, possibly carrying tool-call requests.
    Assistant,
    /// The result of dispatching one tool call, addressed back at the model.
    Tool,
}

/// One request, embedded in an assistant message, to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id, unique within the message that carries it.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments, already parsed from whatever wire form the provider used.
    pub arguments: Value,
}

impl ToolCall {
    /// Builds a tool call from a raw JSON-encoded argument string, as
    /// produced by providers that emit structured tool-calls over the wire.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if `raw_arguments` is not
    /// valid JSON.
    pub fn from_raw_arguments(
        id: impl Into<String>,
        name: impl Into<String>,
        raw_arguments: &str,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            arguments: serde_json::from_str(raw_arguments)?,
        })
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this turn.
    pub role: Role,
    /// Text content; absent on an assistant turn that is pure tool-calls.
    pub content: Option<String>,
    /// Pending tool-call requests, present only on some assistant turns.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Id of the tool call this message answers; set only on `role: Tool`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this message; set only on `role: Tool`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl Message {
    /// Builds a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Builds a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Builds a plain-text assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Builds an assistant message that requests tool calls and carries no
    /// other content.
    #[must_use]
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
        }
    }

    /// Builds a tool-role response answering `tool_call_id`.
    pub fn tool_response(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    /// True if this is an assistant message with one or more pending,
    /// presumably-unanswered tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}
