//! Messages, content blocks, tool calls, and responses.
//!
//! A conversation is a sequence of [`ChatMessage`]s, each holding an
//! ordered list of [`ContentBlock`]s. A completed generation round is a
//! [`ChatResponse`]: content blocks plus [`Usage`] and a [`StopReason`].
//!
//! Block order is meaningful and preserved everywhere — a response with
//! a reasoning section carries `Reasoning` before `Text`, and tool calls
//! appear in the order the model produced them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::usage::Usage;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// System prompt / instructions.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
    /// A locally executed tool reporting its result.
    Tool,
}

/// One ordered piece of a message or response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ContentBlock {
    /// Final answer text.
    Text(String),
    /// Chain-of-thought text, kept separate from the final answer.
    Reasoning(String),
    /// A request from the model to invoke a tool.
    ToolCall(ToolCall),
    /// The local result of a tool invocation.
    ToolResult(ToolResult),
}

/// A structured request from the model to invoke a caller-supplied tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned identifier linking the call to its result.
    pub id: String,
    /// The tool's name, matching a [`ToolDefinition::name`](crate::provider::ToolDefinition::name).
    pub name: String,
    /// Arguments as produced by the model, usually a JSON object.
    pub arguments: Value,
}

/// The outcome of executing one [`ToolCall`] locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The [`ToolCall::id`] this result answers.
    pub tool_call_id: String,
    /// Content to send back to the model.
    pub content: String,
    /// Whether execution failed. Failed results are still fed back —
    /// the model often recovers by adjusting its arguments.
    pub is_error: bool,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    /// Natural end of the response.
    EndTurn,
    /// The `max_tokens` limit cut generation short.
    MaxTokens,
    /// A stop sequence was hit.
    StopSequence,
    /// The model wants tool results before continuing.
    ToolUse,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored this message.
    pub role: ChatRole,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// Creates a user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Creates an assistant message with a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Creates a system message with a single text block.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Creates a successful tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::tool_result_full(ToolResult {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        })
    }

    /// Creates a tool result message from a [`ToolResult`].
    pub fn tool_result_full(result: ToolResult) -> Self {
        Self {
            role: ChatRole::Tool,
            content: vec![ContentBlock::ToolResult(result)],
        }
    }

    /// Concatenated text of all `Text` blocks.
    pub fn text(&self) -> String {
        collect_text(&self.content)
    }
}

/// The complete output of one generation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Ordered content blocks (text, reasoning, tool calls).
    pub content: Vec<ContentBlock>,
    /// Token usage for this round.
    pub usage: Usage,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// The model that produced this response, when reported.
    pub model: String,
    /// Provider-specific extras that don't map to a dedicated field.
    pub metadata: HashMap<String, Value>,
}

impl ChatResponse {
    /// An empty response with [`StopReason::EndTurn`] and zero usage.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            usage: Usage::default(),
            stop_reason: StopReason::EndTurn,
            model: String::new(),
            metadata: HashMap::new(),
        }
    }

    /// Concatenated text of all `Text` blocks.
    pub fn text(&self) -> String {
        collect_text(&self.content)
    }

    /// Concatenated text of all `Reasoning` blocks.
    pub fn reasoning(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Reasoning(r) => Some(r.as_str()),
                _ => None,
            })
            .collect()
    }

    /// References to all tool-call blocks, in order.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Whether the response contains any tool-call blocks.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolCall(_)))
    }
}

fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}
