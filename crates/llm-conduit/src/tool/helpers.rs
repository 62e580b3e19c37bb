//! Helper functions for creating tool handlers.

use std::future::Future;

use serde_json::Value;

use super::{FnToolHandler, ToolError, ToolOutput};
use crate::provider::ToolDefinition;

/// Creates a [`ToolHandler`](super::ToolHandler) from a closure.
///
/// The closure receives the tool's JSON arguments and returns a
/// `Result<impl Into<ToolOutput>, ToolError>`; returning
/// `Result<String, ToolError>` works via the `From<String>` impl on
/// [`ToolOutput`].
///
/// # Example
///
/// ```rust
/// use llm_conduit::tool::tool_fn;
/// use llm_conduit::{JsonSchema, ToolDefinition};
/// use serde_json::{Value, json};
///
/// let handler = tool_fn(
///     ToolDefinition {
///         name: "add".into(),
///         description: "Add two numbers".into(),
///         parameters: JsonSchema::new(json!({
///             "type": "object",
///             "properties": {
///                 "a": { "type": "number" },
///                 "b": { "type": "number" }
///             },
///             "required": ["a", "b"]
///         })),
///     },
///     |input: Value| async move {
///         let a = input["a"].as_f64().unwrap_or(0.0);
///         let b = input["b"].as_f64().unwrap_or(0.0);
///         Ok(format!("{}", a + b))
///     },
/// );
/// ```
pub fn tool_fn<F, Fut, O>(definition: ToolDefinition, handler: F) -> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ToolError>> + Send + 'static,
    O: Into<ToolOutput> + Send + 'static,
{
    FnToolHandler {
        definition,
        handler,
    }
}
