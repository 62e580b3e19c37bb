//! Tool execution engine.
//!
//! This module provides the runtime layer for executing tools that
//! models invoke during generation. It builds on the foundational types
//! from [`chat`](crate::chat) ([`ToolCall`](crate::chat::ToolCall),
//! [`ToolResult`](crate::chat::ToolResult)) and
//! [`provider`](crate::provider)
//! ([`ToolDefinition`](crate::provider::ToolDefinition),
//! [`JsonSchema`](crate::JsonSchema)).
//!
//! # Architecture
//!
//! ```text
//!   ToolHandler          — defines a single tool (schema + execute fn)
//!       │
//!   ToolRegistry         — stores handlers by name, validates & dispatches
//!       │
//!   tool_loop()          — automates generate → execute → feedback rounds
//!   tool_loop_stream()   — same loop, fragments forwarded live
//!   tool_loop_channel()  — same loop behind a bounded channel (backpressure)
//! ```
//!
//! The loop runs until the model answers without requesting tools. It
//! imposes **no round limit** — bounding a conversation that never
//! converges is the caller's job, not the loop's.
//!
//! # Example
//!
//! ```rust,no_run
//! use llm_conduit::tool::{ToolLoopConfig, ToolRegistry, tool_fn, tool_loop};
//! use llm_conduit::{ChatMessage, ChatParams, JsonSchema, ToolDefinition};
//! use serde_json::{Value, json};
//!
//! # async fn example(provider: &dyn llm_conduit::DynProvider) {
//! let mut registry = ToolRegistry::new();
//! registry.register(tool_fn(
//!     ToolDefinition {
//!         name: "add".into(),
//!         description: "Add two numbers".into(),
//!         parameters: JsonSchema::new(json!({
//!             "type": "object",
//!             "properties": {
//!                 "a": {"type": "number"},
//!                 "b": {"type": "number"}
//!             },
//!             "required": ["a", "b"]
//!         })),
//!     },
//!     |input: Value| async move {
//!         let a = input["a"].as_f64().unwrap_or(0.0);
//!         let b = input["b"].as_f64().unwrap_or(0.0);
//!         Ok(format!("{}", a + b))
//!     },
//! ));
//!
//! let params = ChatParams {
//!     messages: vec![ChatMessage::user("What is 2 + 3?")],
//!     ..Default::default()
//! };
//!
//! let result = tool_loop(provider, &registry, params, ToolLoopConfig::default())
//!     .await
//!     .unwrap();
//! println!("Final answer: {}", result.response.text());
//! # }
//! ```

mod config;
mod error;
mod execution;
mod handler;
mod helpers;
mod loop_channel;
mod loop_stream;
mod loop_sync;
mod output;
mod registry;

pub use config::{LoopEvent, LoopStream, ToolLoopConfig, ToolLoopError, ToolLoopResult};
pub use error::ToolError;
pub use handler::{FnToolHandler, ToolHandler};
pub use helpers::tool_fn;
pub use loop_channel::tool_loop_channel;
pub use loop_stream::tool_loop_stream;
pub use loop_sync::tool_loop;
pub use output::ToolOutput;
pub use registry::ToolRegistry;

#[cfg(test)]
mod tests;
