//! Tool loop configuration, results, and event types.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use serde_json::Value;

use crate::chat::{ChatMessage, ChatResponse, ToolCall, ToolResult};
use crate::error::LlmError;
use crate::provider::ToolChoice;
use crate::usage::Usage;

/// Configuration for a tool loop.
///
/// Deliberately small: the loop imposes **no round limit** of its own.
/// It terminates when the model stops requesting tool calls; bounding a
/// runaway conversation (by rounds, tokens, or wall clock) is the
/// caller's responsibility.
#[derive(Debug, Clone)]
pub struct ToolLoopConfig {
    /// Tool-choice policy for the first round.
    ///
    /// [`ToolChoice::Required`] is downgraded to [`ToolChoice::Auto`]
    /// after the first round completes — forcing a call on every round
    /// would never let the model answer.
    pub tool_choice: ToolChoice,
    /// Execute multiple tool calls from one round concurrently.
    ///
    /// Results keep call order either way; only wall-clock overlap
    /// changes.
    pub parallel_tool_execution: bool,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            tool_choice: ToolChoice::Auto,
            parallel_tool_execution: false,
        }
    }
}

/// Result of a completed tool loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolLoopResult {
    /// The messages produced by the loop, in order: assistant replies
    /// and tool-result messages. Does **not** include the caller's
    /// input messages.
    pub messages: Vec<ChatMessage>,
    /// The final round's response (the one without tool calls).
    pub response: ChatResponse,
    /// Usage summed across all rounds.
    pub usage: Usage,
    /// How many generate rounds ran.
    pub iterations: u32,
}

/// A failed tool loop, carrying everything produced before the failure.
///
/// Callers often want the partial transcript even when a round fails —
/// to display it, persist it, or resume from it — so the error type
/// carries it alongside the source error.
#[derive(Debug, thiserror::Error)]
#[error("tool loop failed after {iterations} round(s): {source}")]
pub struct ToolLoopError {
    /// Messages produced before the failure.
    pub messages: Vec<ChatMessage>,
    /// Usage accumulated before the failure.
    pub usage: Usage,
    /// How many generate rounds were started.
    pub iterations: u32,
    /// The underlying failure.
    #[source]
    pub source: LlmError,
}

/// A pinned, boxed, `Send` stream of [`LoopEvent`] results.
///
/// Produced by [`tool_loop_stream`](super::tool_loop_stream). Emits
/// both model streaming events (text/reasoning deltas, tool-call
/// fragments) and loop lifecycle events, and terminates with
/// [`LoopEvent::Done`] carrying the final [`ToolLoopResult`].
pub type LoopStream = Pin<Box<dyn Stream<Item = Result<LoopEvent, LlmError>> + Send>>;

/// Unified event emitted during streaming tool loop execution.
///
/// Merges the provider's [`StreamEvent`](crate::stream::StreamEvent)s
/// with loop-level lifecycle events into a single ordered stream, so a
/// consumer sees everything happening inside the loop.
///
/// # Example
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use llm_conduit::tool::{LoopEvent, ToolLoopConfig, tool_loop_stream};
/// use std::sync::Arc;
///
/// # async fn example(
/// #     provider: Arc<dyn llm_conduit::DynProvider>,
/// #     registry: Arc<llm_conduit::ToolRegistry>,
/// #     params: llm_conduit::ChatParams,
/// # ) {
/// let mut stream = tool_loop_stream(provider, registry, params, ToolLoopConfig::default());
/// while let Some(event) = stream.next().await {
///     match event.unwrap() {
///         LoopEvent::TextDelta(text) => print!("{text}"),
///         LoopEvent::IterationStart { iteration, .. } => {
///             println!("\n--- round {iteration} ---");
///         }
///         LoopEvent::ToolExecutionEnd { tool_name, duration, .. } => {
///             println!("[{tool_name} finished in {duration:?}]");
///         }
///         LoopEvent::Done(result) => {
///             println!("\n{} rounds", result.iterations);
///             break;
///         }
///         _ => {}
///     }
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum LoopEvent {
    // ── Model streaming (forwarded from the provider) ────────────
    /// A fragment of the model's text output.
    TextDelta(String),
    /// A fragment of the model's reasoning output.
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
    /// The fully assembled tool call.
    ToolCallComplete {
        /// The tool-call index this completion corresponds to.
        index: u32,
        /// The complete, parsed tool call.
        call: ToolCall,
    },
    /// Token usage reported by the provider for one round.
    Usage(Usage),

    // ── Loop lifecycle ──────────────────────────────────────────
    /// A new round of the tool loop is starting.
    IterationStart {
        /// The round number (1-indexed).
        iteration: u32,
        /// Number of messages in the conversation so far.
        message_count: usize,
    },
    /// About to execute a tool.
    ///
    /// With `parallel_tool_execution`, start/end pairs arrive in
    /// completion order; correlate via `call_id`.
    ToolExecutionStart {
        /// The tool call ID from the model.
        call_id: String,
        /// Name of the tool being called.
        tool_name: String,
        /// Arguments passed to the tool.
        arguments: Value,
    },
    /// Tool execution completed.
    ToolExecutionEnd {
        /// The tool call ID from the model.
        call_id: String,
        /// Name of the tool that was called.
        tool_name: String,
        /// The result from the tool.
        result: ToolResult,
        /// How long the tool took to execute.
        duration: Duration,
    },

    // ── Terminal ────────────────────────────────────────────────
    /// The loop has finished. Always the last event of the stream.
    Done(ToolLoopResult),
}
