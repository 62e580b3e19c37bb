//! The [`ExtractReasoning`] provider decorator.

use std::collections::VecDeque;

use futures::StreamExt;

use crate::chat::ChatResponse;
use crate::error::LlmError;
use crate::provider::{Capability, ChatParams, Provider, ProviderMetadata};
use crate::stream::{ChatStream, StreamEvent};

use super::filter::TagStreamFilter;
use super::split::split_response;
use super::tags::TagPair;

/// Wraps a provider whose model emits inline `<think>…</think>`
/// sections, reclassifying them as structured reasoning content.
///
/// The wrapped provider is unaware of the reclassification: its raw
/// text is rewritten on the way out, on both the [`generate`](Provider::generate)
/// and [`stream`](Provider::stream) paths. Tool calls ride a separate
/// structured channel and pass through untouched, so this decorator
/// composes freely with the tool loop (stack it *inside*, so reasoning
/// is extracted before tool-call detection sees the text).
#[derive(Debug)]
pub struct ExtractReasoning<P> {
    inner: P,
    tags: TagPair,
}

impl<P> ExtractReasoning<P> {
    /// Wraps `inner` with the default `<think>` / `</think>` pair.
    pub fn new(inner: P) -> Self {
        Self::with_tags(inner, TagPair::default())
    }

    /// Wraps `inner` with a custom delimiter pair.
    pub fn with_tags(inner: P, tags: TagPair) -> Self {
        Self { inner, tags }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwraps, returning the inner provider.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Provider> Provider for ExtractReasoning<P> {
    async fn generate(&self, params: &ChatParams) -> Result<ChatResponse, LlmError> {
        let response = self.inner.generate(params).await?;
        split_response(response, &self.tags)
    }

    async fn stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        let inner = self.inner.stream(params).await?;
        Ok(filter_stream(inner, self.tags.clone()))
    }

    fn metadata(&self) -> ProviderMetadata {
        let mut meta = self.inner.metadata();
        meta.capabilities.insert(Capability::Reasoning);
        meta
    }
}

/// State carried across polls of the filtered stream.
struct FilterDriver {
    inner: Option<ChatStream>,
    filter: TagStreamFilter,
    queue: VecDeque<Result<StreamEvent, LlmError>>,
    failed: bool,
}

/// Wraps a raw provider stream with the tag state machine.
///
/// Events are rewritten in order; a single text delta may become up to
/// two events (reasoning tail + text head). After a hard filter error
/// the remaining upstream events are drained without being forwarded,
/// so the underlying connection is consumed rather than abandoned
/// mid-body.
fn filter_stream(inner: ChatStream, tags: TagPair) -> ChatStream {
    let driver = FilterDriver {
        inner: Some(inner),
        filter: TagStreamFilter::new(tags),
        queue: VecDeque::new(),
        failed: false,
    };

    Box::pin(futures::stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(item) = driver.queue.pop_front() {
                return Some((item, driver));
            }
            let stream = driver.inner.as_mut()?;
            match stream.next().await {
                Some(Ok(event)) => {
                    if driver.failed {
                        continue;
                    }
                    match driver.filter.process(event) {
                        Ok(events) => driver.queue.extend(events.into_iter().map(Ok)),
                        Err(e) => {
                            driver.failed = true;
                            return Some((Err(e), driver));
                        }
                    }
                }
                Some(Err(e)) => {
                    if driver.failed {
                        continue;
                    }
                    return Some((Err(e), driver));
                }
                None => {
                    driver.inner = None;
                    if !driver.failed {
                        driver
                            .queue
                            .extend(driver.filter.finish().into_iter().map(Ok));
                    }
                    if driver.queue.is_empty() {
                        return None;
                    }
                }
            }
        }
    }))
}
