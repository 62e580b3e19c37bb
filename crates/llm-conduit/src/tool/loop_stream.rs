//! Streaming tool loop.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;

use crate::provider::{ChatParams, DynProvider};
use crate::stream::{ChatStream, ResponseAccumulator, StreamEvent};

use super::ToolRegistry;
use super::config::{LoopEvent, LoopStream, ToolLoopConfig};
use super::loop_sync::{LoopState, RoundOutcome};

/// Streaming variant of [`tool_loop`](super::tool_loop).
///
/// Forwards each round's fragments to the caller live while the loop
/// accumulates them internally to decide whether tools were requested.
/// Between rounds, tool execution progress is reported through
/// [`ToolExecutionStart`](LoopEvent::ToolExecutionStart) /
/// [`ToolExecutionEnd`](LoopEvent::ToolExecutionEnd) events. The stream
/// terminates with [`LoopEvent::Done`] carrying the final
/// [`ToolLoopResult`](super::ToolLoopResult).
///
/// The provider's per-round `Done` events are absorbed into the round
/// accumulator rather than forwarded — round boundaries show up as
/// [`IterationStart`](LoopEvent::IterationStart) events instead, and
/// the final stop reason rides the terminal result.
///
/// Dropping the stream mid-round cancels the in-flight provider call.
/// For a variant that keeps the round alive when the consumer walks
/// away, see [`tool_loop_channel`](super::tool_loop_channel).
///
/// Uses `Arc` for the provider and registry since they must outlive the
/// returned stream.
///
/// # Errors
///
/// Yielded in-band: the same failures as
/// [`tool_loop`](super::tool_loop), each terminating the stream. After
/// an error no `Done` event follows.
pub fn tool_loop_stream(
    provider: Arc<dyn DynProvider>,
    registry: Arc<ToolRegistry>,
    params: ChatParams,
    config: ToolLoopConfig,
) -> LoopStream {
    let state = match LoopState::new(&registry, params, config) {
        Ok(state) => state,
        Err(e) => {
            return Box::pin(futures::stream::once(async move { Err(e.source) }));
        }
    };

    let driver = StreamDriver {
        provider,
        registry,
        state,
        phase: Phase::StartRound,
        queue: VecDeque::new(),
    };

    Box::pin(futures::stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(item) = driver.queue.pop_front() {
                return Some((item, driver));
            }
            match std::mem::replace(&mut driver.phase, Phase::Finished) {
                Phase::Finished => return None,
                Phase::StartRound => driver.start_round().await,
                Phase::Streaming { stream, acc } => driver.pump(stream, acc).await,
            }
        }
    }))
}

/// Internal state for the streaming tool loop.
struct StreamDriver {
    provider: Arc<dyn DynProvider>,
    registry: Arc<ToolRegistry>,
    state: LoopState,
    phase: Phase,
    queue: VecDeque<Result<LoopEvent, crate::error::LlmError>>,
}

enum Phase {
    /// Open the next round's provider stream.
    StartRound,
    /// Pull fragments off the current round's stream.
    Streaming {
        stream: ChatStream,
        acc: ResponseAccumulator,
    },
    /// Terminal — unfold returns `None` once the queue drains.
    Finished,
}

impl StreamDriver {
    async fn start_round(&mut self) {
        self.queue.push_back(Ok(LoopEvent::IterationStart {
            iteration: self.state.iterations() + 1,
            message_count: self.state.message_count(),
        }));
        match self.provider.stream_boxed(&self.state.conversation).await {
            Ok(stream) => {
                self.phase = Phase::Streaming {
                    stream,
                    acc: ResponseAccumulator::new(),
                };
            }
            Err(e) => {
                let err = self.state.fail(e);
                self.queue.push_back(Err(err.source));
                // phase stays Finished
            }
        }
    }

    async fn pump(&mut self, mut stream: ChatStream, mut acc: ResponseAccumulator) {
        match stream.next().await {
            Some(Ok(event)) => {
                acc.push(&event);
                if matches!(event, StreamEvent::Done { .. }) {
                    // Round over; the boundary is reported via
                    // IterationStart / Done instead.
                    self.finish_round(acc).await;
                } else {
                    if let Some(loop_event) = forward(event) {
                        self.queue.push_back(Ok(loop_event));
                    }
                    self.phase = Phase::Streaming { stream, acc };
                }
            }
            Some(Err(e)) => {
                self.queue.push_back(Err(e));
                // phase stays Finished
            }
            None => self.finish_round(acc).await,
        }
    }

    async fn finish_round(&mut self, acc: ResponseAccumulator) {
        let response = acc.finish();
        match self.state.absorb_round(&self.registry, response).await {
            Ok(RoundOutcome::Continue) => {
                let events = std::mem::take(&mut self.state.pending_events);
                self.queue.extend(events.into_iter().map(Ok));
                self.phase = Phase::StartRound;
            }
            Ok(RoundOutcome::Finished(result)) => {
                self.queue.push_back(Ok(LoopEvent::Done(result)));
                // phase stays Finished
            }
            Err(e) => {
                self.queue.push_back(Err(e.source));
                // phase stays Finished
            }
        }
    }
}

/// Translates a provider event into its loop-level twin.
///
/// Per-round `Done` events return `None` — they are loop-internal.
fn forward(event: StreamEvent) -> Option<LoopEvent> {
    match event {
        StreamEvent::TextDelta(text) => Some(LoopEvent::TextDelta(text)),
        StreamEvent::ReasoningDelta(text) => Some(LoopEvent::ReasoningDelta(text)),
        StreamEvent::ToolCallStart { index, id, name } => {
            Some(LoopEvent::ToolCallStart { index, id, name })
        }
        StreamEvent::ToolCallDelta { index, json_chunk } => {
            Some(LoopEvent::ToolCallDelta { index, json_chunk })
        }
        StreamEvent::ToolCallComplete { index, call } => {
            Some(LoopEvent::ToolCallComplete { index, call })
        }
        StreamEvent::Usage(usage) => Some(LoopEvent::Usage(usage)),
        StreamEvent::Done { .. } => None,
    }
}
