//! Streaming response types and fragment accumulation.
//!
//! When a provider streams its response, it yields a sequence of
//! [`StreamEvent`]s through a [`ChatStream`]. Events arrive
//! incrementally — text deltas, reasoning deltas, tool-call fragments,
//! and finally a [`Done`](StreamEvent::Done) event with the stop
//! reason.
//!
//! The concatenation of all `TextDelta` payloads across a stream equals
//! the text of the accumulated response, in order; same for
//! `ReasoningDelta`. [`ResponseAccumulator`] performs that fold, and
//! [`collect_stream`] drives an entire stream through one.
//!
//! # Collecting a stream
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use llm_conduit::{ChatStream, StreamEvent};
//!
//! async fn print_stream(mut stream: ChatStream) {
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             Ok(StreamEvent::TextDelta(text)) => print!("{text}"),
//!             Ok(StreamEvent::Done { stop_reason }) => {
//!                 println!("\n[done: {stop_reason:?}]");
//!             }
//!             Err(e) => eprintln!("stream error: {e}"),
//!             _ => {} // handle other events as needed
//!         }
//!     }
//! }
//! ```
//!
//! # Tool-call reassembly
//!
//! Tool calls arrive in three phases:
//! 1. [`ToolCallStart`](StreamEvent::ToolCallStart) — announces the
//!    call's `id` and `name`.
//! 2. [`ToolCallDelta`](StreamEvent::ToolCallDelta) — one or more JSON
//!    argument fragments.
//! 3. [`ToolCallComplete`](StreamEvent::ToolCallComplete) — the fully
//!    assembled [`ToolCall`].
//!
//! The `index` field identifies which call an event belongs to when the
//! model invokes multiple tools in parallel.

use std::collections::HashMap;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatResponse, ContentBlock, StopReason, ToolCall};
use crate::error::LlmError;
use crate::usage::Usage;

/// A pinned, boxed, `Send` stream of [`StreamEvent`] results.
///
/// Consume it with [`StreamExt`](futures::StreamExt) from the `futures`
/// crate. The stream is finite and non-restartable.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// An incremental event emitted during a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum StreamEvent {
    /// A fragment of the model's text output.
    TextDelta(String),
    /// A fragment of the model's reasoning (chain-of-thought) output.
    ReasoningDelta(String),
    /// Announces that a new tool call has started.
    ToolCallStart {
        /// Zero-based index identifying this call when multiple tools
        /// are invoked in parallel.
        index: u32,
        /// Provider-assigned identifier linking start → deltas → complete.
        id: String,
        /// The name of the tool being called.
        name: String,
    },
    /// A JSON fragment of the tool call's arguments.
    ToolCallDelta {
        /// The tool-call index this delta belongs to.
        index: u32,
        /// A chunk of the JSON arguments string.
        json_chunk: String,
    },
    /// The fully assembled tool call, ready to execute.
    ToolCallComplete {
        /// The tool-call index this completion corresponds to.
        index: u32,
        /// The complete, parsed tool call.
        call: ToolCall,
    },
    /// Token usage information for the request so far.
    Usage(Usage),
    /// The stream has ended.
    Done {
        /// Why the model stopped generating.
        stop_reason: StopReason,
    },
}

// ── Accumulation ────────────────────────────────────────────────────

/// Folds [`StreamEvent`]s back into a [`ChatResponse`].
///
/// Reasoning deltas accumulate ahead of text deltas in the finished
/// content, matching arrival order: a reasoning section always precedes
/// the answer it belongs to. `ToolCallStart`/`ToolCallDelta` fragments
/// are ignored — only `ToolCallComplete` contributes a call.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    reasoning: String,
    text: String,
    tool_calls: Vec<ToolCall>,
    usage: Usage,
    stop_reason: Option<StopReason>,
}

impl ResponseAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one event into the accumulator.
    pub fn push(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextDelta(t) => self.text.push_str(t),
            StreamEvent::ReasoningDelta(r) => self.reasoning.push_str(r),
            StreamEvent::ToolCallComplete { call, .. } => self.tool_calls.push(call.clone()),
            StreamEvent::Usage(u) => self.usage += u,
            StreamEvent::Done { stop_reason } => self.stop_reason = Some(*stop_reason),
            // ToolCallStart / ToolCallDelta carry no accumulated state
            _ => {}
        }
    }

    /// Whether any tool call has been completed so far.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Consumes the accumulator and builds the response.
    pub fn finish(self) -> ChatResponse {
        let mut content = Vec::new();
        if !self.reasoning.is_empty() {
            content.push(ContentBlock::Reasoning(self.reasoning));
        }
        if !self.text.is_empty() {
            content.push(ContentBlock::Text(self.text));
        }
        for call in self.tool_calls {
            content.push(ContentBlock::ToolCall(call));
        }
        ChatResponse {
            content,
            usage: self.usage,
            stop_reason: self.stop_reason.unwrap_or(StopReason::EndTurn),
            model: String::new(),
            metadata: HashMap::new(),
        }
    }
}

/// Collects an entire [`ChatStream`] into a [`ChatResponse`].
///
/// The first stream error aborts collection and is returned as-is.
pub async fn collect_stream(mut stream: ChatStream) -> Result<ChatResponse, LlmError> {
    let mut acc = ResponseAccumulator::new();
    while let Some(event) = stream.next().await {
        acc.push(&event?);
    }
    Ok(acc.finish())
}
