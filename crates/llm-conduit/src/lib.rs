//! # llm-conduit
//!
//! Provider-agnostic types and composable plumbing for generative-AI
//! chat APIs: one [`Provider`] trait, streaming fragments with lossless
//! accumulation, inline-reasoning extraction, and a tool-call loop.
//!
//! This crate deliberately contains **zero** wire-format code — HTTP
//! mapping, authentication, and retries live in concrete provider
//! implementations behind the [`Provider`] trait (or its object-safe
//! counterpart [`DynProvider`]).
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │           concrete providers (HTTP, local, …)        │
//!  └──────────────────────────┬───────────────────────────┘
//!                             │ implements
//!                             ▼
//!  ┌──────────────────────────────────────────────────────┐
//!  │               Provider / DynProvider                 │
//!  └────┬──────────────────────┬──────────────────────────┘
//!       │ wrapped by           │ driven by
//!       ▼                      ▼
//!  ExtractReasoning      tool_loop / tool_loop_stream
//!  IgnoreUnsupported     tool_loop_channel
//! ```
//!
//! The decorators stack: wrap a provider in
//! [`ExtractReasoning`](reasoning::ExtractReasoning) first so reasoning
//! is separated before the tool loop inspects the reply (tool calls
//! ride a separate structured channel and are unaffected either way).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use llm_conduit::{ChatMessage, ChatParams, Provider};
//!
//! # async fn example(provider: impl Provider) -> Result<(), llm_conduit::LlmError> {
//! let params = ChatParams {
//!     messages: vec![ChatMessage::user("Explain ownership in Rust")],
//!     max_tokens: Some(1024),
//!     ..Default::default()
//! };
//!
//! let response = provider.generate(&params).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chat`] | Messages, content blocks, tool calls, and responses |
//! | [`compat`] | Capability tolerance for heterogeneous providers |
//! | [`error`] | Unified [`LlmError`] across all operations |
//! | [`provider`] | The [`Provider`] trait and request parameters |
//! | [`reasoning`] | Inline `<think>…</think>` extraction, streaming and whole-string |
//! | [`stream`] | Stream events, the [`ChatStream`] alias, and accumulation |
//! | [`tool`] | Tool execution engine: registry, handlers, and the tool loop |
//! | [`usage`] | Token counters |

#![warn(missing_docs)]

pub mod chat;
pub mod compat;
pub mod error;
pub mod provider;
pub mod reasoning;
pub mod stream;
pub mod tool;
pub mod usage;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

// ── Core re-exports ────────────────────────────────────────────────
//
// Only the types that appear in nearly every program are re-exported
// at the crate root. Everything else lives in its submodule:
//
//   llm_conduit::tool::*       — tool loop variants, loop events
//   llm_conduit::provider::*   — capabilities, metadata
//   llm_conduit::chat::*       — StopReason, ChatRole, ToolResult
//   llm_conduit::reasoning::*  — ExtractReasoning, TagPair
//   llm_conduit::stream::*     — ResponseAccumulator, collect_stream
//   llm_conduit::compat::*     — IgnoreUnsupported
//   llm_conduit::mock::*       — MockProvider (test-utils feature)

pub use chat::{ChatMessage, ChatResponse, ContentBlock, ToolCall, ToolResult};
pub use error::LlmError;
pub use provider::{ChatParams, DynProvider, JsonSchema, Provider, ToolChoice, ToolDefinition};
pub use stream::{ChatStream, StreamEvent};
pub use tool::{ToolHandler, ToolLoopConfig, ToolRegistry};
pub use usage::Usage;
