//! Unit tests for the tool loop variants.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Value, json};

use crate::chat::{ChatMessage, ChatRole, ContentBlock, StopReason, ToolCall};
use crate::error::LlmError;
use crate::provider::{ChatParams, JsonSchema, ToolChoice, ToolDefinition};
use crate::test_helpers::{mock_for, sample_response, sample_tool_response, sample_usage};

use super::{
    LoopEvent, ToolError, ToolLoopConfig, ToolRegistry, tool_fn, tool_loop, tool_loop_stream,
};

fn calculator_definition() -> ToolDefinition {
    ToolDefinition {
        name: "calculator".into(),
        description: "Perform basic arithmetic".into(),
        parameters: JsonSchema::new(json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" },
                "operation": { "type": "string", "enum": ["add", "subtract", "multiply"] }
            },
            "required": ["a", "b", "operation"]
        })),
    }
}

fn calculator_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tool_fn(calculator_definition(), |input: Value| async move {
        let a = input["a"].as_f64().unwrap_or(0.0);
        let b = input["b"].as_f64().unwrap_or(0.0);
        let value = match input["operation"].as_str() {
            Some("add") => a + b,
            Some("subtract") => a - b,
            Some("multiply") => a * b,
            other => return Err(ToolError::new(format!("unknown operation: {other:?}"))),
        };
        Ok(format!("{value}"))
    }));
    registry
}

fn calculator_call() -> ToolCall {
    ToolCall {
        id: "tc_1".into(),
        name: "calculator".into(),
        arguments: json!({"a": 5, "b": 3, "operation": "add"}),
    }
}

fn ask(text: &str) -> ChatParams {
    ChatParams {
        messages: vec![ChatMessage::user(text)],
        ..Default::default()
    }
}

// ── tool_loop ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_loop_empty_registry_is_configuration_error() {
    let mock = mock_for("test", "test-model");
    let registry = ToolRegistry::new();

    let err = tool_loop(&mock, &registry, ask("hi"), ToolLoopConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err.source, LlmError::Configuration(_)));
    assert_eq!(err.iterations, 0);
    // Nothing reached the provider.
    assert!(mock.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_loop_no_tool_calls_single_round() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_response("hello"));
    let registry = calculator_registry();

    let result = tool_loop(&mock, &registry, ask("hi"), ToolLoopConfig::default())
        .await
        .unwrap();
    assert_eq!(result.iterations, 1);
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].role, ChatRole::Assistant);
    assert_eq!(result.response.text(), "hello");
}

#[tokio::test]
async fn test_loop_calculator_two_rounds() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![calculator_call()]));
    mock.queue_response(sample_response("5 + 3 = 8"));
    let registry = calculator_registry();

    let result = tool_loop(
        &mock,
        &registry,
        ask("Calculate 5+3"),
        ToolLoopConfig::default(),
    )
    .await
    .unwrap();

    // Exactly two generate calls.
    assert_eq!(mock.recorded_calls().len(), 2);
    assert_eq!(result.iterations, 2);

    // New messages: assistant (tool call) + tool result + final assistant.
    assert_eq!(result.messages.len(), 3);
    assert_eq!(result.messages[0].role, ChatRole::Assistant);
    assert_eq!(result.messages[1].role, ChatRole::Tool);
    assert_eq!(result.messages[2].role, ChatRole::Assistant);

    // The tool result fed back to the model is "8".
    match &result.messages[1].content[0] {
        ContentBlock::ToolResult(tr) => {
            assert_eq!(tr.content, "8");
            assert_eq!(tr.tool_call_id, "tc_1");
            assert!(!tr.is_error);
        }
        other => panic!("expected tool result, got {other:?}"),
    }

    // Usage is the sum of both rounds.
    let expected = sample_usage() + sample_usage();
    assert_eq!(result.usage, expected);
    assert_eq!(result.response.text(), "5 + 3 = 8");
}

#[tokio::test]
async fn test_loop_sets_tools_on_request() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_response("ok"));
    let registry = calculator_registry();

    tool_loop(&mock, &registry, ask("hi"), ToolLoopConfig::default())
        .await
        .unwrap();

    let recorded = mock.recorded_calls();
    let tools = recorded[0].tools.as_ref().expect("tools should be set");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "calculator");
    assert_eq!(recorded[0].tool_choice, Some(ToolChoice::Auto));
}

#[tokio::test]
async fn test_loop_required_downgraded_to_auto_after_first_round() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![calculator_call()]));
    mock.queue_response(sample_response("8"));
    let registry = calculator_registry();

    let config = ToolLoopConfig {
        tool_choice: ToolChoice::Required,
        ..Default::default()
    };
    tool_loop(&mock, &registry, ask("Calculate 5+3"), config)
        .await
        .unwrap();

    let recorded = mock.recorded_calls();
    assert_eq!(recorded[0].tool_choice, Some(ToolChoice::Required));
    assert_eq!(recorded[1].tool_choice, Some(ToolChoice::Auto));
}

#[tokio::test]
async fn test_loop_unknown_tool_aborts_with_partial_transcript() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![ToolCall {
        id: "tc_1".into(),
        name: "frobnicate".into(),
        arguments: json!({}),
    }]));
    let registry = calculator_registry();

    let err = tool_loop(&mock, &registry, ask("go"), ToolLoopConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        &err.source,
        LlmError::UnknownTool { name } if name == "frobnicate"
    ));
    // The assistant message that requested the tool is still returned.
    assert_eq!(err.messages.len(), 1);
    assert_eq!(err.usage, sample_usage());
    assert_eq!(err.iterations, 1);
}

#[tokio::test]
async fn test_loop_provider_error_returns_partials() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![calculator_call()]));
    mock.queue_error(crate::mock::MockError::Http {
        status: Some(http::StatusCode::INTERNAL_SERVER_ERROR),
        message: "server error".into(),
        retryable: true,
    });
    let registry = calculator_registry();

    let err = tool_loop(
        &mock,
        &registry,
        ask("Calculate 5+3"),
        ToolLoopConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err.source, LlmError::Http { .. }));
    // Round 1's assistant message and tool result survive the failure.
    assert_eq!(err.messages.len(), 2);
    assert_eq!(err.usage, sample_usage());
    assert_eq!(err.iterations, 1);
}

#[tokio::test]
async fn test_loop_does_not_mutate_caller_params() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![calculator_call()]));
    mock.queue_response(sample_response("8"));
    let registry = calculator_registry();

    let params = ask("Calculate 5+3");
    let snapshot = params.clone();
    tool_loop(&mock, &registry, params.clone(), ToolLoopConfig::default())
        .await
        .unwrap();
    assert_eq!(params, snapshot);
}

#[tokio::test]
async fn test_loop_failed_tool_result_feeds_back() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![ToolCall {
        id: "tc_1".into(),
        name: "calculator".into(),
        arguments: json!({"a": 1, "b": 2, "operation": "add"}),
    }]));
    mock.queue_response(sample_response("done"));

    let mut registry = ToolRegistry::new();
    registry.register(tool_fn(calculator_definition(), |_input: Value| async move {
        Err::<String, _>(ToolError::new("arithmetic overflow"))
    }));

    let result = tool_loop(&mock, &registry, ask("go"), ToolLoopConfig::default())
        .await
        .unwrap();
    match &result.messages[1].content[0] {
        ContentBlock::ToolResult(tr) => {
            assert!(tr.is_error);
            assert_eq!(tr.content, "arithmetic overflow");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    // The loop continued to round 2 despite the tool failure.
    assert_eq!(result.iterations, 2);
}

#[tokio::test]
async fn test_loop_multiple_calls_one_round() {
    let mock = mock_for("test", "test-model");
    mock.queue_response(sample_tool_response(vec![
        ToolCall {
            id: "tc_1".into(),
            name: "calculator".into(),
            arguments: json!({"a": 1, "b": 2, "operation": "add"}),
        },
        ToolCall {
            id: "tc_2".into(),
            name: "calculator".into(),
            arguments: json!({"a": 2, "b": 3, "operation": "multiply"}),
        },
    ]));
    mock.queue_response(sample_response("3 and 6"));
    let registry = calculator_registry();

    let result = tool_loop(&mock, &registry, ask("both"), ToolLoopConfig::default())
        .await
        .unwrap();

    // assistant + two tool results + final assistant
    assert_eq!(result.messages.len(), 4);
    let contents: Vec<&str> = result.messages[1..3]
        .iter()
        .map(|m| match &m.content[0] {
            ContentBlock::ToolResult(tr) => tr.content.as_str(),
            other => panic!("expected tool result, got {other:?}"),
        })
        .collect();
    assert_eq!(contents, vec!["3", "6"]);
}

// ── tool_loop_stream ────────────────────────────────────────────────

async fn collect_loop_events(
    mock: crate::mock::MockProvider,
    registry: ToolRegistry,
    params: ChatParams,
    config: ToolLoopConfig,
) -> Vec<Result<LoopEvent, LlmError>> {
    let stream = tool_loop_stream(Arc::new(mock), Arc::new(registry), params, config);
    stream.collect().await
}

#[tokio::test]
async fn test_stream_loop_single_round_event_order() {
    let mock = mock_for("test", "test-model");
    mock.queue_stream(vec![
        crate::stream::StreamEvent::TextDelta("hel".into()),
        crate::stream::StreamEvent::TextDelta("lo".into()),
        crate::stream::StreamEvent::Usage(sample_usage()),
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let events = collect_loop_events(
        mock,
        calculator_registry(),
        ask("hi"),
        ToolLoopConfig::default(),
    )
    .await;
    let events: Vec<LoopEvent> = events.into_iter().map(Result::unwrap).collect();

    assert!(matches!(
        events[0],
        LoopEvent::IterationStart { iteration: 1, .. }
    ));
    assert!(matches!(&events[1], LoopEvent::TextDelta(t) if t == "hel"));
    assert!(matches!(&events[2], LoopEvent::TextDelta(t) if t == "lo"));
    assert!(matches!(events[3], LoopEvent::Usage(_)));
    match &events[4] {
        LoopEvent::Done(result) => {
            assert_eq!(result.iterations, 1);
            assert_eq!(result.response.text(), "hello");
            assert_eq!(result.usage, sample_usage());
        }
        other => panic!("expected Done, got {other:?}"),
    }
    assert_eq!(events.len(), 5);
}

#[tokio::test]
async fn test_stream_loop_two_rounds_with_tool_execution() {
    let mock = mock_for("test", "test-model");
    mock.queue_stream(vec![
        crate::stream::StreamEvent::ToolCallStart {
            index: 0,
            id: "tc_1".into(),
            name: "calculator".into(),
        },
        crate::stream::StreamEvent::ToolCallComplete {
            index: 0,
            call: calculator_call(),
        },
        crate::stream::StreamEvent::Usage(sample_usage()),
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::ToolUse,
        },
    ]);
    mock.queue_stream(vec![
        crate::stream::StreamEvent::TextDelta("8".into()),
        crate::stream::StreamEvent::Usage(sample_usage()),
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let events = collect_loop_events(
        mock,
        calculator_registry(),
        ask("Calculate 5+3"),
        ToolLoopConfig::default(),
    )
    .await;
    let events: Vec<LoopEvent> = events.into_iter().map(Result::unwrap).collect();

    // Two round boundaries.
    let iteration_starts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            LoopEvent::IterationStart { iteration, .. } => Some(*iteration),
            _ => None,
        })
        .collect();
    assert_eq!(iteration_starts, vec![1, 2]);

    // Tool execution start/end pair with the computed result.
    assert!(events.iter().any(|e| matches!(
        e,
        LoopEvent::ToolExecutionStart { tool_name, .. } if tool_name == "calculator"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        LoopEvent::ToolExecutionEnd { result, .. } if result.content == "8"
    )));

    // Terminal Done carries summed usage and the full transcript.
    match events.last().unwrap() {
        LoopEvent::Done(result) => {
            assert_eq!(result.iterations, 2);
            assert_eq!(result.usage, sample_usage() + sample_usage());
            assert_eq!(result.messages.len(), 3);
        }
        other => panic!("expected Done, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_loop_empty_registry_yields_configuration_error() {
    let mock = mock_for("test", "test-model");
    let events =
        collect_loop_events(mock, ToolRegistry::new(), ask("hi"), ToolLoopConfig::default()).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Err(LlmError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_stream_loop_unknown_tool_errors_no_done() {
    let mock = mock_for("test", "test-model");
    mock.queue_stream(vec![
        crate::stream::StreamEvent::ToolCallComplete {
            index: 0,
            call: ToolCall {
                id: "tc_1".into(),
                name: "frobnicate".into(),
                arguments: json!({}),
            },
        },
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::ToolUse,
        },
    ]);

    let events = collect_loop_events(
        mock,
        calculator_registry(),
        ask("go"),
        ToolLoopConfig::default(),
    )
    .await;

    let last = events.last().unwrap();
    assert!(matches!(last, Err(LlmError::UnknownTool { .. })));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Ok(LoopEvent::Done(_))))
    );
}

#[tokio::test]
async fn test_stream_loop_provider_stream_error_terminates() {
    let mock = mock_for("test", "test-model");
    mock.queue_stream_error(crate::mock::MockError::Auth("bad token".into()));

    let events = collect_loop_events(
        mock,
        calculator_registry(),
        ask("hi"),
        ToolLoopConfig::default(),
    )
    .await;

    // IterationStart, then the error.
    assert!(matches!(events[0], Ok(LoopEvent::IterationStart { .. })));
    assert!(matches!(events[1], Err(LlmError::Auth(_))));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_stream_loop_required_downgrade_observable() {
    let mock = mock_for("test", "test-model");
    mock.queue_stream(vec![
        crate::stream::StreamEvent::ToolCallComplete {
            index: 0,
            call: calculator_call(),
        },
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::ToolUse,
        },
    ]);
    mock.queue_stream(vec![
        crate::stream::StreamEvent::TextDelta("8".into()),
        crate::stream::StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let mock = Arc::new(mock);
    let config = ToolLoopConfig {
        tool_choice: ToolChoice::Required,
        ..Default::default()
    };
    let stream = tool_loop_stream(
        mock.clone(),
        Arc::new(calculator_registry()),
        ask("Calculate 5+3"),
        config,
    );
    let _events: Vec<_> = stream.collect().await;

    let recorded = mock.recorded_calls();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].tool_choice, Some(ToolChoice::Required));
    assert_eq!(recorded[1].tool_choice, Some(ToolChoice::Auto));
}
