//! Whole-string reasoning extraction for non-streaming replies.

use crate::chat::{ChatResponse, ContentBlock};
use crate::error::LlmError;

use super::tags::TagPair;

/// Splits raw reply text into `(reasoning, text)` at the delimiter pair.
///
/// Returns `Ok(None)` when the start delimiter is absent — the reply
/// simply has no reasoning section (JSON output, models that skip it)
/// and should be used unchanged. A missing *end* delimiter makes the
/// entire remainder reasoning: the reply was truncated mid-thought and
/// the partial reasoning is still worth returning; the truncation
/// itself shows up in the stop reason, not here.
///
/// # Errors
///
/// [`LlmError::UnexpectedPrefix`] when non-whitespace content precedes
/// the start delimiter.
pub fn split_text(raw: &str, tags: &TagPair) -> Result<Option<(String, String)>, LlmError> {
    let Some(pos) = raw.find(tags.start.as_str()) else {
        return Ok(None);
    };
    let prefix = &raw[..pos];
    if !prefix.trim().is_empty() {
        return Err(LlmError::UnexpectedPrefix {
            prefix: prefix.to_string(),
        });
    }

    let after = raw[pos + tags.start.len()..].trim_start();
    let (reasoning, text) = match after.find(tags.end.as_str()) {
        Some(end_pos) => (
            &after[..end_pos],
            after[end_pos + tags.end.len()..].trim_start(),
        ),
        None => (after, ""),
    };
    Ok(Some((reasoning.to_string(), text.to_string())))
}

/// Applies [`split_text`] to a complete [`ChatResponse`].
///
/// Text blocks are replaced by a `Reasoning` block followed by a `Text`
/// block (either omitted when empty); non-text blocks such as tool
/// calls keep their relative order after the text. When no start
/// delimiter is present the response is returned untouched.
///
/// # Errors
///
/// [`LlmError::UnexpectedReasoning`] when the response already contains
/// `Reasoning` blocks — the provider natively separates reasoning and
/// this filter must not be stacked on top of it.
/// [`LlmError::UnexpectedPrefix`] as for [`split_text`].
pub fn split_response(response: ChatResponse, tags: &TagPair) -> Result<ChatResponse, LlmError> {
    if response
        .content
        .iter()
        .any(|block| matches!(block, ContentBlock::Reasoning(_)))
    {
        return Err(LlmError::UnexpectedReasoning);
    }

    let raw = response.text();
    let Some((reasoning, text)) = split_text(&raw, tags)? else {
        return Ok(response);
    };

    let ChatResponse {
        content: old_content,
        usage,
        stop_reason,
        model,
        metadata,
    } = response;

    let mut content = Vec::with_capacity(old_content.len() + 1);
    if !reasoning.is_empty() {
        content.push(ContentBlock::Reasoning(reasoning));
    }
    if !text.is_empty() {
        content.push(ContentBlock::Text(text));
    }
    content.extend(
        old_content
            .into_iter()
            .filter(|block| !matches!(block, ContentBlock::Text(_))),
    );

    Ok(ChatResponse {
        content,
        usage,
        stop_reason,
        model,
        metadata,
    })
}
