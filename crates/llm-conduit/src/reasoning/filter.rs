//! The streaming tag-extraction state machine.

use crate::error::LlmError;
use crate::stream::StreamEvent;

use super::tags::TagPair;

/// Where the filter is within the reasoning/text layout of a reply.
///
/// Progression is strictly forward:
/// `Start → StartTagSeen → ReasoningSeen → EndTagSeen → TextSeen`,
/// with two shortcuts — `Start → TextSeen` when no start delimiter ever
/// appears, and `StartTagSeen`/`EndTagSeen` may be skipped over when a
/// single fragment carries delimiter and content together. `TextSeen`
/// is terminal: every later fragment passes through as text unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    /// Nothing classified yet; waiting for the start delimiter or the
    /// first non-whitespace text.
    Start,
    /// Start delimiter consumed; waiting for the first non-whitespace
    /// reasoning content.
    StartTagSeen,
    /// Inside the reasoning section.
    ReasoningSeen,
    /// End delimiter consumed; waiting for the first non-whitespace
    /// answer text.
    EndTagSeen,
    /// Inside the answer text.
    TextSeen,
}

/// Per-fragment reasoning extractor for streamed replies.
///
/// Feed raw provider events through [`process`](Self::process); each
/// call returns the (possibly rewritten, possibly empty) events to
/// forward downstream. Call [`finish`](Self::finish) once the upstream
/// ends to flush anything still held back.
///
/// A fragment is never reordered — at most it is split in two (the tail
/// of a reasoning section and the head of the answer), and held-back
/// bytes are released before anything that arrives after them.
///
/// # Errors
///
/// [`process`](Self::process) fails on a fragment that already carries
/// a [`ReasoningDelta`](StreamEvent::ReasoningDelta) (the filter is
/// stacked onto a provider with native reasoning) and on non-whitespace
/// content preceding the start delimiter. Errors are terminal: the
/// caller must stop feeding fragments and drain the upstream.
#[derive(Debug)]
pub struct TagStreamFilter {
    tags: TagPair,
    state: TagState,
    /// Unclassified text: leading whitespace that may yet be suppressed,
    /// or a trailing run that is still a proper prefix of the delimiter
    /// currently being looked for.
    pending: String,
}

impl TagStreamFilter {
    /// Creates a filter for the given delimiter pair.
    pub fn new(tags: TagPair) -> Self {
        Self {
            tags,
            state: TagState::Start,
            pending: String::new(),
        }
    }

    /// Processes one upstream event, returning the events to forward.
    ///
    /// Text deltas are reclassified per the state machine; tool-call
    /// and usage events pass through untouched; a `Done` event first
    /// flushes any held-back text so it is delivered ahead of the
    /// terminal event.
    pub fn process(&mut self, event: StreamEvent) -> Result<Vec<StreamEvent>, LlmError> {
        match event {
            StreamEvent::TextDelta(text) => self.push_text(&text),
            StreamEvent::ReasoningDelta(_) => Err(LlmError::UnexpectedReasoningFragment),
            StreamEvent::Done { .. } => {
                let mut events = self.finish();
                events.push(event);
                Ok(events)
            }
            other => Ok(vec![other]),
        }
    }

    /// Feeds one text delta through the state machine.
    pub fn push_text(&mut self, delta: &str) -> Result<Vec<StreamEvent>, LlmError> {
        // A fragment carrying nothing is suppressed outright.
        if delta.is_empty() && self.pending.is_empty() {
            return Ok(Vec::new());
        }
        self.pending.push_str(delta);

        let mut out = Vec::new();
        loop {
            match self.state {
                TagState::Start => {
                    self.drop_leading_whitespace();
                    if self.pending.is_empty() {
                        return Ok(out);
                    }
                    let start = &self.tags.start;
                    if self.pending.starts_with(start.as_str()) {
                        self.pending.drain(..start.len());
                        self.state = TagState::StartTagSeen;
                        continue;
                    }
                    if start.starts_with(self.pending.as_str()) {
                        // The start delimiter may still complete.
                        return Ok(out);
                    }
                    if let Some(pos) = self.pending.find(start.as_str()) {
                        return Err(LlmError::UnexpectedPrefix {
                            prefix: self.pending[..pos].to_string(),
                        });
                    }
                    if trailing_partial(&self.pending, start) > 0 {
                        // A delimiter may still complete at a non-zero
                        // offset; hold everything until it resolves one
                        // way or the other.
                        return Ok(out);
                    }
                    // No delimiter, none forming: the reply has no
                    // reasoning section at all.
                    self.state = TagState::TextSeen;
                }
                TagState::StartTagSeen => {
                    self.drop_leading_whitespace();
                    if self.pending.is_empty() {
                        return Ok(out);
                    }
                    self.state = TagState::ReasoningSeen;
                }
                TagState::ReasoningSeen => {
                    let end = &self.tags.end;
                    if let Some(pos) = self.pending.find(end.as_str()) {
                        if pos > 0 {
                            out.push(StreamEvent::ReasoningDelta(
                                self.pending[..pos].to_string(),
                            ));
                        }
                        self.pending.drain(..pos + end.len());
                        self.state = TagState::EndTagSeen;
                        continue;
                    }
                    let hold = trailing_partial(&self.pending, end);
                    let emit = self.pending.len() - hold;
                    if emit > 0 {
                        let chunk: String = self.pending.drain(..emit).collect();
                        out.push(StreamEvent::ReasoningDelta(chunk));
                    }
                    return Ok(out);
                }
                TagState::EndTagSeen => {
                    self.drop_leading_whitespace();
                    if self.pending.is_empty() {
                        return Ok(out);
                    }
                    self.state = TagState::TextSeen;
                }
                TagState::TextSeen => {
                    if !self.pending.is_empty() {
                        out.push(StreamEvent::TextDelta(std::mem::take(&mut self.pending)));
                    }
                    return Ok(out);
                }
            }
        }
    }

    /// Flushes anything still held back at end-of-stream.
    ///
    /// Pending text in `Start` never became a delimiter, so it is text;
    /// pending text in `ReasoningSeen` is a reasoning tail whose end
    /// delimiter never arrived — the reply was truncated, the partial
    /// reasoning is still delivered, and no error is raised.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let held = std::mem::take(&mut self.pending);
        match self.state {
            TagState::Start => {
                self.state = TagState::TextSeen;
                vec![StreamEvent::TextDelta(held)]
            }
            TagState::ReasoningSeen => vec![StreamEvent::ReasoningDelta(held)],
            // Only suppressed whitespace can be pending in these
            // states, and it is dropped on entry, never stored.
            TagState::StartTagSeen | TagState::EndTagSeen | TagState::TextSeen => Vec::new(),
        }
    }

    fn drop_leading_whitespace(&mut self) {
        let trimmed = self.pending.trim_start().len();
        let ws = self.pending.len() - trimmed;
        if ws > 0 {
            self.pending.drain(..ws);
        }
    }
}

/// Length of the longest *proper* prefix of `tag` that is a suffix of
/// `text`. Zero when no suffix of `text` could grow into `tag`.
fn trailing_partial(text: &str, tag: &str) -> usize {
    let max = tag.len().saturating_sub(1).min(text.len());
    for len in (1..=max).rev() {
        if tag.is_char_boundary(len) && text.ends_with(&tag[..len]) {
            return len;
        }
    }
    0
}
