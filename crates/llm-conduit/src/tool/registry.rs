//! Tool registry for managing and executing tools.

use std::collections::HashMap;
use std::sync::Arc;

use super::ToolHandler;
use crate::chat::{ToolCall, ToolResult};
use crate::provider::ToolDefinition;

/// A registry of tool handlers, indexed by name.
///
/// Provides validation of tool call arguments against their schemas
/// (with the `schema` feature) and sequential or concurrent execution
/// of multiple tool calls.
///
/// Handler failures are captured as `ToolResult { is_error: true }`
/// rather than bubbling up — a failed result is still fed back to the
/// model, which often recovers by adjusting its arguments. Only the
/// tool loop treats an *unregistered* tool name as fatal; direct
/// callers of [`execute`](Self::execute) get an error result.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl Clone for ToolRegistry {
    /// Clone the registry.
    ///
    /// This is cheap — it clones `Arc` pointers to handlers, not the
    /// handlers themselves.
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool handler.
    ///
    /// If a handler with the same name already exists, it is replaced.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> &mut Self {
        let name = handler.definition().name.clone();
        self.handlers.insert(name, Arc::new(handler));
        self
    }

    /// Registers a shared tool handler.
    pub fn register_shared(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let name = handler.definition().name.clone();
        self.handlers.insert(name, handler);
        self
    }

    /// Returns the handler for the given tool name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Returns whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the definitions of all registered tools.
    ///
    /// The tool loop passes these to the provider automatically; direct
    /// callers put them in [`ChatParams::tools`](crate::provider::ChatParams::tools).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Executes a single tool call.
    ///
    /// 1. Looks up the handler by [`ToolCall::name`]
    /// 2. Validates arguments against the tool's parameter schema
    ///    (`schema` feature)
    /// 3. Invokes the handler
    ///
    /// Always returns a [`ToolResult`]; lookup, validation, and
    /// execution failures are captured in
    /// [`is_error`](ToolResult::is_error). Schema failures are reported
    /// distinctly from handler failures in the result content.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        self.execute_by_name(&call.name, &call.id, call.arguments.clone())
            .await
    }

    /// Executes a tool by name with owned arguments.
    ///
    /// Used internally when the call components are already separated,
    /// avoiding an extra deep clone of `serde_json::Value`.
    pub(crate) async fn execute_by_name(
        &self,
        name: &str,
        call_id: &str,
        arguments: serde_json::Value,
    ) -> ToolResult {
        let Some(handler) = self.handlers.get(name) else {
            return ToolResult {
                tool_call_id: call_id.to_string(),
                content: format!("Unknown tool: {name}"),
                is_error: true,
            };
        };

        // Validate arguments against schema
        #[cfg(feature = "schema")]
        {
            let definition = handler.definition();
            if let Err(e) = definition.parameters.validate(&arguments) {
                return ToolResult {
                    tool_call_id: call_id.to_string(),
                    content: format!("Invalid arguments for tool '{name}': {e}"),
                    is_error: true,
                };
            }
        }

        match handler.execute(arguments).await {
            Ok(output) => ToolResult {
                tool_call_id: call_id.to_string(),
                content: output.content,
                is_error: false,
            },
            Err(e) => ToolResult {
                tool_call_id: call_id.to_string(),
                content: e.message,
                is_error: true,
            },
        }
    }

    /// Executes multiple tool calls, preserving order.
    ///
    /// When `parallel` is true, all calls run concurrently via
    /// `futures::future::join_all`; results still come back in call
    /// order. When false, they run sequentially.
    pub async fn execute_all(&self, calls: &[ToolCall], parallel: bool) -> Vec<ToolResult> {
        if !parallel || calls.len() <= 1 {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.execute(call).await);
            }
            return results;
        }

        let futures: Vec<_> = calls.iter().map(|call| self.execute(call)).collect();
        futures::future::join_all(futures).await
    }
}
