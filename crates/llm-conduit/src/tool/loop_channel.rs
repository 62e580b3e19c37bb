//! Channel-based tool loop with backpressure.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::LlmError;
use crate::provider::{ChatParams, DynProvider};

use super::ToolRegistry;
use super::config::{LoopEvent, ToolLoopConfig, ToolLoopResult};
use super::loop_stream::tool_loop_stream;

/// Channel-based variant of [`tool_loop_stream`](super::tool_loop_stream).
///
/// Spawns a producer task that drives the loop and sends events through
/// a bounded channel. The bound gives natural backpressure: a slow
/// consumer throttles the producer once the buffer fills, instead of
/// events piling up in memory.
///
/// Returns the event receiver and a join handle yielding the final
/// [`ToolLoopResult`] (`None` when the loop ended early or failed — the
/// failure itself arrives through the channel).
///
/// # Buffer sizing
///
/// - Small (4–16): tight backpressure, minimal memory
/// - Medium (32–64): balance between latency and memory
/// - Large (128+): more latency tolerance, higher memory
///
/// # Consumer drop
///
/// If the receiver is dropped mid-round, the producer stops forwarding
/// but keeps draining the loop until the current round completes, so
/// the in-flight provider call and tool executions are consumed rather
/// than abandoned; it then stops at the next round boundary.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use llm_conduit::tool::{LoopEvent, ToolLoopConfig, tool_loop_channel};
/// use llm_conduit::{ChatMessage, ChatParams, ToolRegistry};
///
/// # async fn example(
/// #     provider: Arc<dyn llm_conduit::DynProvider>,
/// #     registry: Arc<ToolRegistry>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let params = ChatParams {
///     messages: vec![ChatMessage::user("What is 2 + 3?")],
///     ..Default::default()
/// };
///
/// let (mut rx, handle) =
///     tool_loop_channel(provider, registry, params, ToolLoopConfig::default(), 32);
///
/// while let Some(event) = rx.recv().await {
///     match event? {
///         LoopEvent::TextDelta(text) => print!("{text}"),
///         LoopEvent::Done(_) => break,
///         _ => {}
///     }
/// }
///
/// if let Some(result) = handle.await? {
///     println!("\nCompleted in {} round(s)", result.iterations);
/// }
/// # Ok(())
/// # }
/// ```
pub fn tool_loop_channel(
    provider: Arc<dyn DynProvider>,
    registry: Arc<ToolRegistry>,
    params: ChatParams,
    config: ToolLoopConfig,
    buffer: usize,
) -> (
    mpsc::Receiver<Result<LoopEvent, LlmError>>,
    JoinHandle<Option<ToolLoopResult>>,
) {
    let (tx, rx) = mpsc::channel(buffer);

    let handle = tokio::spawn(async move {
        let mut stream = tool_loop_stream(provider, registry, params, config);
        let mut final_result = None;
        let mut receiver_gone = false;

        while let Some(item) = stream.next().await {
            if receiver_gone {
                // Drain until the current round ends; the next round
                // boundary is the stopping point.
                if matches!(item, Ok(LoopEvent::IterationStart { .. })) {
                    break;
                }
                if let Ok(LoopEvent::Done(result)) = item {
                    final_result = Some(result);
                    break;
                }
                continue;
            }

            if let Ok(LoopEvent::Done(ref result)) = item {
                final_result = Some(result.clone());
            }
            if tx.send(item).await.is_err() {
                receiver_gone = true;
            }
        }

        final_result
    });

    (rx, handle)
}
