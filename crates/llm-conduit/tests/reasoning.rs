//! End-to-end reasoning extraction tests, including composition with
//! the tool loop.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Value, json};

use llm_conduit::chat::{ContentBlock, StopReason};
use llm_conduit::reasoning::{ExtractReasoning, TagPair};
use llm_conduit::test_helpers::{collect_stream_events, mock_for, sample_usage};
use llm_conduit::tool::{LoopEvent, ToolLoopConfig, tool_fn, tool_loop_stream};
use llm_conduit::{
    ChatMessage, ChatParams, ChatResponse, JsonSchema, Provider, StreamEvent, ToolCall,
    ToolDefinition, ToolRegistry,
};

fn thinking_tags() -> TagPair {
    TagPair::new("<thinking>", "</thinking>")
}

// ── Streaming extraction ─────────────────────────────────────────────

#[tokio::test]
async fn test_streamed_reply_splits_into_reasoning_and_text() {
    let provider = ExtractReasoning::with_tags(mock_for("test", "test-model"), thinking_tags());
    provider.inner().queue_stream(vec![
        StreamEvent::TextDelta("<thinking>".into()),
        StreamEvent::TextDelta("This is my ".into()),
        StreamEvent::TextDelta("thinking process".into()),
        StreamEvent::TextDelta("</thinking>".into()),
        StreamEvent::TextDelta("This is the response".into()),
        StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let stream = provider.stream(&ChatParams::default()).await.unwrap();
    let response = llm_conduit::stream::collect_stream(stream).await.unwrap();
    assert_eq!(
        response.content,
        vec![
            ContentBlock::Reasoning("This is my thinking process".into()),
            ContentBlock::Text("This is the response".into()),
        ]
    );
}

#[tokio::test]
async fn test_streamed_delimiters_split_at_awkward_boundaries() {
    let provider = ExtractReasoning::new(mock_for("test", "test-model"));
    provider.inner().queue_stream(vec![
        StreamEvent::TextDelta("<th".into()),
        StreamEvent::TextDelta("ink>first ".into()),
        StreamEvent::TextDelta("half</t".into()),
        StreamEvent::TextDelta("hink>second half".into()),
        StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let stream = provider.stream(&ChatParams::default()).await.unwrap();
    let events = collect_stream_events(stream).await;

    let reasoning: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ReasoningDelta(r) => Some(r.as_str()),
            _ => None,
        })
        .collect();
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::TextDelta(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(reasoning, "first half");
    assert_eq!(text, "second half");
}

#[tokio::test]
async fn test_streamed_no_tag_is_plain_text() {
    let provider = ExtractReasoning::new(mock_for("test", "test-model"));
    provider.inner().queue_stream(vec![
        StreamEvent::TextDelta("{\"answer\":".into()),
        StreamEvent::TextDelta(" 42}".into()),
        StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let stream = provider.stream(&ChatParams::default()).await.unwrap();
    let response = llm_conduit::stream::collect_stream(stream).await.unwrap();
    assert_eq!(response.text(), "{\"answer\": 42}");
    assert_eq!(response.reasoning(), "");
}

#[tokio::test]
async fn test_streamed_truncated_reasoning_kept() {
    let provider = ExtractReasoning::new(mock_for("test", "test-model"));
    provider.inner().queue_stream(vec![
        StreamEvent::TextDelta("<think>ran out of".into()),
        StreamEvent::Done {
            stop_reason: StopReason::MaxTokens,
        },
    ]);

    let stream = provider.stream(&ChatParams::default()).await.unwrap();
    let response = llm_conduit::stream::collect_stream(stream).await.unwrap();
    assert_eq!(response.reasoning(), "ran out of");
    assert_eq!(response.text(), "");
    assert_eq!(response.stop_reason, StopReason::MaxTokens);
}

// ── Whole-string extraction ──────────────────────────────────────────

#[tokio::test]
async fn test_generate_path_matches_streaming_split() {
    let provider = ExtractReasoning::with_tags(mock_for("test", "test-model"), thinking_tags());
    provider.inner().queue_response(ChatResponse {
        content: vec![ContentBlock::Text(
            "<thinking>This is my thinking process</thinking>This is the response".into(),
        )],
        usage: sample_usage(),
        stop_reason: StopReason::EndTurn,
        model: "test-model".into(),
        metadata: Default::default(),
    });

    let response = provider.generate(&ChatParams::default()).await.unwrap();
    assert_eq!(
        response.content,
        vec![
            ContentBlock::Reasoning("This is my thinking process".into()),
            ContentBlock::Text("This is the response".into()),
        ]
    );
}

// ── Composition with the tool loop ───────────────────────────────────

#[tokio::test]
async fn test_reasoning_extraction_inside_tool_loop() {
    let mock = mock_for("test", "test-model");
    // Round 1: inline reasoning, then a tool call on the structured channel.
    mock.queue_stream(vec![
        StreamEvent::TextDelta("<think>need the calculator</think>".into()),
        StreamEvent::TextDelta("Let me compute that.".into()),
        StreamEvent::ToolCallComplete {
            index: 0,
            call: ToolCall {
                id: "tc_1".into(),
                name: "calculator".into(),
                arguments: json!({"a": 5, "b": 3, "operation": "add"}),
            },
        },
        StreamEvent::Done {
            stop_reason: StopReason::ToolUse,
        },
    ]);
    // Round 2: plain final answer.
    mock.queue_stream(vec![
        StreamEvent::TextDelta("<think>done</think>".into()),
        StreamEvent::TextDelta("8".into()),
        StreamEvent::Done {
            stop_reason: StopReason::EndTurn,
        },
    ]);

    let mut registry = ToolRegistry::new();
    registry.register(tool_fn(
        ToolDefinition {
            name: "calculator".into(),
            description: "Add two numbers".into(),
            parameters: JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" },
                    "operation": { "type": "string" }
                },
                "required": ["a", "b"]
            })),
        },
        |input: Value| async move {
            let a = input["a"].as_f64().unwrap_or(0.0);
            let b = input["b"].as_f64().unwrap_or(0.0);
            Ok(format!("{}", a + b))
        },
    ));

    let provider = ExtractReasoning::new(mock);
    let params = ChatParams {
        messages: vec![ChatMessage::user("Calculate 5+3")],
        ..Default::default()
    };
    let mut stream = tool_loop_stream(
        Arc::new(provider),
        Arc::new(registry),
        params,
        ToolLoopConfig::default(),
    );

    let mut reasoning = String::new();
    let mut done = None;
    while let Some(event) = stream.next().await {
        match event.unwrap() {
            LoopEvent::ReasoningDelta(r) => reasoning.push_str(&r),
            LoopEvent::Done(result) => done = Some(result),
            _ => {}
        }
    }

    assert_eq!(reasoning, "need the calculatordone");
    let result = done.expect("loop should finish");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.response.text(), "8");
    assert_eq!(result.response.reasoning(), "done");

    // The round-1 assistant message carries the reclassified blocks.
    assert_eq!(
        result.messages[0].content,
        vec![
            ContentBlock::Reasoning("need the calculator".into()),
            ContentBlock::Text("Let me compute that.".into()),
            ContentBlock::ToolCall(ToolCall {
                id: "tc_1".into(),
                name: "calculator".into(),
                arguments: json!({"a": 5, "b": 3, "operation": "add"}),
            }),
        ]
    );
}
