//! Chat-mood proxy against a mocked completion gateway

use httpmock::Method::POST;
use httpmock::MockServer;
use httpmock::prelude::HttpMockRequest;
use moodmoji_api::config::GatewayConfig;
use moodmoji_api::core::error::CompanionError;
use moodmoji_api::core::prompt::{ChatMessage, Role};
use moodmoji_api::core::proxy::{ChatRequest, GatewayChatProxy};
use moodmoji_api::core::traits::ChatProxy;
use serde_json::json;
use std::time::Duration;

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Only the last five turns may be forwarded, so the two oldest must be absent.
fn omits_oldest_turns(request: &HttpMockRequest) -> bool {
    let body = String::from_utf8_lossy(request.body.as_deref().unwrap_or_default());
    !body.contains("turn-0") && !body.contains("turn-1")
}

fn proxy_for(server: &MockServer) -> GatewayChatProxy {
    GatewayChatProxy::new(GatewayConfig::for_endpoint(
        server.base_url(),
        Some("test-key".to_string()),
    ))
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        history: Vec::new(),
    }
}

#[tokio::test]
async fn reply_is_stripped_of_mood_marker() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("DETECTED_MOOD")
                .body_contains("I got the job!");
            then.status(200).json_body(completion(
                "That's wonderful news! 🎉 DETECTED_MOOD: excited",
            ));
        })
        .await;

    let reply = proxy_for(&server)
        .complete(request("I got the job!"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply.response, "That's wonderful news! 🎉");
    assert_eq!(reply.detected_mood, "excited");
}

#[tokio::test]
async fn missing_marker_defaults_to_neutral() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion("Tell me more."));
        })
        .await;

    let reply = proxy_for(&server).complete(request("hmm")).await.unwrap();

    assert_eq!(reply.response, "Tell me more.");
    assert_eq!(reply.detected_mood, "neutral");
}

#[tokio::test]
async fn only_the_last_five_turns_are_forwarded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("turn-6")
                .body_contains("turn-2")
                .body_contains("latest question")
                .matches(omits_oldest_turns);
            then.status(200)
                .json_body(completion("Sure. DETECTED_MOOD: calm"));
        })
        .await;

    let history = (0..7)
        .map(|i| ChatMessage {
            role: if i % 2 == 0 { Role::User } else { Role::Assistant },
            content: format!("turn-{i}"),
        })
        .collect();

    let reply = proxy_for(&server)
        .complete(ChatRequest {
            message: "latest question".to_string(),
            history,
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply.detected_mood, "calm");
}

#[tokio::test]
async fn rate_limit_and_quota_are_distinguished() {
    for (status, expected) in [(429, "Rate limit"), (402, "credits exhausted")] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(status).body("slow down");
            })
            .await;

        let error = proxy_for(&server)
            .complete(request("hello"))
            .await
            .unwrap_err();

        match (status, &error) {
            (429, CompanionError::RateLimited) | (402, CompanionError::QuotaExhausted) => {}
            _ => panic!("status {status} mapped to {error:?}"),
        }
        assert!(error.to_string().contains(expected));
    }
}

#[tokio::test]
async fn other_gateway_failures_carry_the_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        })
        .await;

    let error = proxy_for(&server)
        .complete(request("hello"))
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "AI Gateway error: 503");
}

#[tokio::test]
async fn empty_message_never_reaches_the_gateway() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion("unused"));
        })
        .await;

    let error = proxy_for(&server)
        .complete(request("   "))
        .await
        .unwrap_err();

    assert!(matches!(error, CompanionError::InvalidInput(_)));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_out() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion("unused"));
        })
        .await;

    let proxy = GatewayChatProxy::new(GatewayConfig::for_endpoint(server.base_url(), None));
    let error = proxy.complete(request("hello")).await.unwrap_err();

    assert_eq!(error.to_string(), "LLM_GATEWAY_API_KEY not configured");
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(completion("too late"));
        })
        .await;

    let mut config = GatewayConfig::for_endpoint(server.base_url(), Some("test-key".into()));
    config.timeout = Duration::from_millis(200);

    let error = GatewayChatProxy::new(config)
        .complete(request("hello"))
        .await
        .unwrap_err();

    assert!(matches!(error, CompanionError::Timeout(_)));
}

#[tokio::test]
async fn empty_choices_is_an_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let error = proxy_for(&server)
        .complete(request("hello"))
        .await
        .unwrap_err();

    assert!(matches!(error, CompanionError::Upstream(_)));
}
