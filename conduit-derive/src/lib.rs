//! Procedural macros for the conduit agent runtime.
//!
//! - [`tool`] - Attribute macro for converting functions into tools

extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{ItemFn, parse_macro_input};

mod tool;

/// Attribute macro that transforms a function into a [`conduit::tool::Tool`].
///
/// # Arguments
///
/// - `description` - Optional description of the tool for model context
/// - `params(...)` - Optional parameter descriptions for each argument
/// - `required(...)` - List of required parameters
///
/// # Examples
///
/// ```rust,ignore
/// use conduit_derive::tool;
///
/// #[tool(description = "Add two integers")]
/// fn add(a: i64, b: i64) -> Result<i64, conduit::tool::ToolError> {
///     Ok(a + b)
/// }
/// ```
#[proc_macro_attribute]
pub fn tool(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as tool::ToolMacroArgs);
    let input_fn = parse_macro_input!(input as ItemFn);

    tool::expand_tool(args, input_fn)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
