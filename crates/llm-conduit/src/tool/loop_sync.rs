//! Single-shot (non-streaming) tool loop.

use tracing::instrument;

use crate::chat::{ChatMessage, ChatRole, ToolCall};
use crate::error::LlmError;
use crate::provider::{ChatParams, DynProvider, ToolChoice};
use crate::usage::Usage;

use super::ToolRegistry;
use super::config::{ToolLoopConfig, ToolLoopError, ToolLoopResult};
use super::execution::execute_with_events;

/// Runs the model in a tool-calling loop until it answers without
/// requesting tools.
///
/// Each round:
/// 1. Calls `provider.generate_boxed()` with the working conversation
///    (the registry's definitions and the current tool choice are set
///    on the request automatically).
/// 2. Appends the assistant reply to the output list and the working
///    conversation.
/// 3. If the reply contains no tool calls, stops successfully.
/// 4. Executes every requested call via the registry, appends one
///    tool-result message per result, and repeats.
///
/// The caller's `params` are taken by value; the caller's own message
/// storage is never touched, and the produced messages come back in
/// [`ToolLoopResult::messages`].
///
/// [`ToolChoice::Required`] is downgraded to [`ToolChoice::Auto`] after
/// the first round — a model can only be forced to call a tool on the
/// first turn, otherwise it could never produce a final answer.
///
/// # Termination
///
/// Guaranteed only if the model eventually replies without tool calls.
/// This function imposes no round limit — bound it externally (rounds,
/// tokens, or `tokio::time::timeout`) if the model can't be trusted to
/// converge.
///
/// # Errors
///
/// Fails with [`LlmError::Configuration`] when the registry is empty,
/// [`LlmError::UnknownTool`] when the model requests an unregistered
/// tool, and propagates provider errors unchanged. The returned
/// [`ToolLoopError`] always carries the messages and usage accumulated
/// before the failure.
#[instrument(skip_all, fields(tools = registry.len()))]
pub async fn tool_loop(
    provider: &dyn DynProvider,
    registry: &ToolRegistry,
    params: ChatParams,
    config: ToolLoopConfig,
) -> Result<ToolLoopResult, ToolLoopError> {
    let mut loop_state = LoopState::new(registry, params, config)?;

    loop {
        let response = match provider.generate_boxed(&loop_state.conversation).await {
            Ok(response) => response,
            Err(e) => return Err(loop_state.fail(e)),
        };
        match loop_state.absorb_round(registry, response).await? {
            RoundOutcome::Continue => {}
            RoundOutcome::Finished(result) => return Ok(result),
        }
    }
}

/// What a completed round means for the loop.
pub(crate) enum RoundOutcome {
    /// Tool results were appended; run another round.
    Continue,
    /// The model answered without tool calls.
    Finished(ToolLoopResult),
}

/// Shared round bookkeeping for the sync and streaming loops.
///
/// Owns the working conversation and the accumulated output; the
/// provider call itself stays with the caller so the streaming variant
/// can drive it fragment-by-fragment.
pub(crate) struct LoopState {
    pub(crate) conversation: ChatParams,
    tool_choice: ToolChoice,
    parallel: bool,
    messages: Vec<ChatMessage>,
    usage: Usage,
    iterations: u32,
    /// Events from the most recent tool execution, for the streaming
    /// variant to forward. The sync loop leaves them unread.
    pub(crate) pending_events: Vec<super::config::LoopEvent>,
}

impl LoopState {
    pub(crate) fn new(
        registry: &ToolRegistry,
        mut params: ChatParams,
        config: ToolLoopConfig,
    ) -> Result<Self, ToolLoopError> {
        if registry.is_empty() {
            return Err(ToolLoopError {
                messages: Vec::new(),
                usage: Usage::default(),
                iterations: 0,
                source: LlmError::Configuration(
                    "tool loop requires at least one registered tool".into(),
                ),
            });
        }
        params.tools = Some(registry.definitions());
        params.tool_choice = Some(config.tool_choice.clone());
        Ok(Self {
            conversation: params,
            tool_choice: config.tool_choice,
            parallel: config.parallel_tool_execution,
            messages: Vec::new(),
            usage: Usage::default(),
            iterations: 0,
            pending_events: Vec::new(),
        })
    }

    /// Round count so far (the round being absorbed is already counted).
    pub(crate) fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of messages currently in the working conversation.
    pub(crate) fn message_count(&self) -> usize {
        self.conversation.messages.len()
    }

    /// Wraps an error with everything accumulated so far.
    pub(crate) fn fail(&mut self, source: LlmError) -> ToolLoopError {
        ToolLoopError {
            messages: std::mem::take(&mut self.messages),
            usage: std::mem::take(&mut self.usage),
            iterations: self.iterations,
            source,
        }
    }

    /// Digests one round's response: bookkeeping, termination check,
    /// tool execution, message append, policy downgrade.
    pub(crate) async fn absorb_round(
        &mut self,
        registry: &ToolRegistry,
        response: crate::chat::ChatResponse,
    ) -> Result<RoundOutcome, ToolLoopError> {
        self.iterations += 1;
        self.usage += &response.usage;
        tracing::debug!(
            iteration = self.iterations,
            stop_reason = ?response.stop_reason,
            tool_calls = response.tool_calls().len(),
            "round complete"
        );

        let assistant = ChatMessage {
            role: ChatRole::Assistant,
            content: response.content.clone(),
        };
        self.messages.push(assistant.clone());
        self.conversation.messages.push(assistant);

        let calls: Vec<ToolCall> = response.tool_calls().into_iter().cloned().collect();
        if calls.is_empty() {
            return Ok(RoundOutcome::Finished(ToolLoopResult {
                messages: std::mem::take(&mut self.messages),
                response,
                usage: std::mem::take(&mut self.usage),
                iterations: self.iterations,
            }));
        }

        if let Some(call) = calls.iter().find(|call| !registry.contains(&call.name)) {
            let name = call.name.clone();
            return Err(self.fail(LlmError::UnknownTool { name }));
        }

        let execution = execute_with_events(registry, calls, self.parallel).await;
        if execution.results.is_empty() {
            return Err(self.fail(LlmError::NoToolResult));
        }
        self.pending_events = execution.events;

        for result in execution.results {
            let message = ChatMessage::tool_result_full(result);
            self.messages.push(message.clone());
            self.conversation.messages.push(message);
        }

        if self.tool_choice == ToolChoice::Required {
            // Forcing a call is only meaningful on the first turn.
            self.tool_choice = ToolChoice::Auto;
            self.conversation.tool_choice = Some(ToolChoice::Auto);
        }

        Ok(RoundOutcome::Continue)
    }
}
