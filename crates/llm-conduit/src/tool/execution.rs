//! Tool execution with event collection.

use std::time::Instant;

use futures::{StreamExt, stream};

use crate::chat::{ToolCall, ToolResult};

use super::ToolRegistry;
use super::config::LoopEvent;

/// Result of executing tool calls: the results plus the events generated.
pub(crate) struct ExecutionResult {
    pub results: Vec<ToolResult>,
    pub events: Vec<LoopEvent>,
}

/// Execute tool calls, collecting start/end events.
///
/// Accepts owned `Vec<ToolCall>` to avoid deep-cloning `serde_json::Value`
/// arguments. Uses streams for unified parallel/sequential execution:
/// - Parallel: `buffer_unordered` (completion order)
/// - Sequential: `then` (call order)
///
/// **Event ordering**: with `parallel`, `ToolExecutionStart`/`End`
/// pairs are collected in completion order, not call order; correlate
/// via `call_id`.
pub(crate) async fn execute_with_events(
    registry: &ToolRegistry,
    calls: Vec<ToolCall>,
    parallel: bool,
) -> ExecutionResult {
    if calls.is_empty() {
        return ExecutionResult {
            results: Vec::new(),
            events: Vec::new(),
        };
    }

    let call_count = calls.len();
    let mut events = Vec::with_capacity(call_count * 2);

    // Moves the owned ToolCall apart, no deep-clone of arguments.
    let execute_one = |call: ToolCall| {
        let ToolCall {
            id: call_id,
            name: tool_name,
            arguments,
        } = call;
        async move {
            let start_event = LoopEvent::ToolExecutionStart {
                call_id: call_id.clone(),
                tool_name: tool_name.clone(),
                arguments: arguments.clone(),
            };

            let start = Instant::now();
            let result = registry
                .execute_by_name(&tool_name, &call_id, arguments)
                .await;
            let duration = start.elapsed();
            tracing::debug!(tool = %tool_name, ?duration, is_error = result.is_error, "tool executed");

            let end_event = LoopEvent::ToolExecutionEnd {
                call_id,
                tool_name,
                result: result.clone(),
                duration,
            };
            (result, start_event, end_event)
        }
    };

    let outcomes: Vec<(ToolResult, LoopEvent, LoopEvent)> = if parallel && call_count > 1 {
        stream::iter(calls)
            .map(execute_one)
            .buffer_unordered(call_count)
            .collect()
            .await
    } else {
        stream::iter(calls).then(execute_one).collect().await
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for (result, start_event, end_event) in outcomes {
        events.push(start_event);
        events.push(end_event);
        results.push(result);
    }

    ExecutionResult { results, events }
}
