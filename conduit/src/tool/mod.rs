//! Callable capabilities: schema, dispatch, and the text-embedded tool-call
//! recovery pipeline used by providers without structured tool-call support.

mod definition;
mod parser;
mod registry;
mod traits;

pub use definition::ToolDefinition;
pub use parser::{ParsedToolCall, parse_text_tool_call};
pub use registry::ToolBox;
pub use traits::{BoxedTool, Tool, ToolDyn, ToolError};
