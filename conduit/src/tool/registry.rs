//! The tool registry consumed by the executor and the planner.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::definition::ToolDefinition;
use super::traits::{BoxedTool, Tool, ToolDyn, ToolError};

/// An immutable-after-registration set of callable tools, keyed by name.
#[derive(Default)]
pub struct ToolBox {
    tools: HashMap<String, BoxedTool>,
}

impl std::fmt::Debug for ToolBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBox")
            .field("names", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolBox {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool, replacing any previous tool with the same name.
    pub fn add<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = Tool::name(&tool).to_string();
        self.tools.insert(name, Box::new(tool));
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// True if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of every registered tool, in registration-unspecified
    /// (hash-map) order. Callers needing a stable order should sort by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Dispatches one call by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if no tool is registered under
    /// `name`, [`ToolError::InvalidArguments`] if `args` does not match the
    /// tool's schema, or [`ToolError::Execution`] if the tool itself failed.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let Some(tool) = self.tools.get(name) else {
            debug!(tool = name, "tool not found");
            return Err(ToolError::NotFound(name.to_string()));
        };
        tool.call_json(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Default)]
    struct AddTool;

    #[derive(Debug, Deserialize)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    #[async_trait]
    impl Tool for AddTool {
        const NAME: &'static str = "add";
        type Args = AddArgs;
        type Output = i64;
        type Error = ToolError;

        fn description(&self) -> String {
            "Adds two integers".to_string()
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.a + args.b)
        }
    }

    #[tokio::test]
    async fn dispatches_registered_tool() {
        let mut toolbox = ToolBox::new();
        toolbox.add(AddTool);

        let result = toolbox
            .call("add", serde_json::json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(result, Value::from(5));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let toolbox = ToolBox::new();
        let err = toolbox.call("missing", Value::Null).await.unwrap_err();
        assert_eq!(err, ToolError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported() {
        let mut toolbox = ToolBox::new();
        toolbox.add(AddTool);

        let err = toolbox
            .call("add", serde_json::json!({"a": "not a number"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
