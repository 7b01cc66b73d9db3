use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use culture_lens::gateway::openrouter::{ChatProvider, OpenRouterAdapter};
use culture_lens::gateway::{
    Attribution, ChatModel, ChatRequest, FinishReason, GatewayConfig, Message, ProviderError,
    ProviderGateway,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn request() -> ChatRequest {
    ChatRequest::new(
        ChatModel::openrouter("google/gemini-2.5-flash"),
        vec![Message::system("sys"), Message::user("hi")],
        Attribution::new("test"),
    )
}

fn adapter(server: &MockServer) -> OpenRouterAdapter {
    OpenRouterAdapter::with_config("sk-test", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn openrouter_parses_success_content_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "**Diagnóstico de Alinhamento: Forte Alinhamento**" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20 }
        })))
        .mount(&server)
        .await;

    let resp = adapter(&server).chat(&request()).await.unwrap();
    assert_eq!(
        resp.content,
        "**Diagnóstico de Alinhamento: Forte Alinhamento**"
    );
    assert_eq!(resp.finish_reason, FinishReason::Stop);
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 20);

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "google/gemini-2.5-flash");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["temperature"], 0.0);
    assert!(body.get("max_tokens").is_none());
}

#[tokio::test]
async fn openrouter_detects_refusal_from_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "I cannot comply with that request." },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).chat(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Refused { .. }));
}

#[tokio::test]
async fn openrouter_classifies_http_429_as_rate_limit_and_keeps_context() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-request-id", "abc123")
                .set_body_json(json!({
                    "error": { "message": "rate limited", "code": "rate_limit_exceeded" }
                })),
        )
        .mount(&server)
        .await;

    let err = adapter(&server).chat(&request()).await.unwrap_err();
    match err {
        ProviderError::RateLimited {
            retry_after,
            context,
        } => {
            assert_eq!(retry_after, Duration::from_secs(60));
            let ctx = context.expect("expected error context");
            assert_eq!(ctx.http_status, Some(429));
            assert_eq!(ctx.provider_code.as_deref(), Some("rate_limit_exceeded"));
            assert_eq!(ctx.request_id.as_deref(), Some("abc123"));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn openrouter_maps_rejected_keys_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "API key not valid. Please pass a valid API key." }
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).chat(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn empty_api_key_is_a_config_error() {
    let err = OpenRouterAdapter::with_config("  ", "http://localhost", Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, ProviderError::Config(_)));
}

#[derive(Clone)]
struct FlipResponder {
    calls: Arc<AtomicUsize>,
    first: ResponseTemplate,
    second: ResponseTemplate,
}

impl Respond for FlipResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            self.first.clone()
        } else {
            self.second.clone()
        }
    }
}

fn ok_body() -> serde_json::Value {
    json!({
        "choices": [{
            "message": { "content": "ok" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 1, "completion_tokens": 1 }
    })
}

fn fast_retry() -> GatewayConfig {
    GatewayConfig {
        max_retries: 1,
        retry_base_delay: Duration::from_millis(0),
    }
}

#[tokio::test]
async fn provider_gateway_retries_on_retryable_errors_and_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(FlipResponder {
            calls: Arc::new(AtomicUsize::new(0)),
            first: ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "transient error", "code": "internal" }
            })),
            second: ResponseTemplate::new(200).set_body_json(ok_body()),
        })
        .mount(&server)
        .await;

    let gateway = ProviderGateway::with_config(adapter(&server), fast_retry());
    let resp = gateway.chat(request()).await.unwrap();
    assert_eq!(resp.content, "ok");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn provider_gateway_does_not_retry_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(FlipResponder {
            calls: Arc::new(AtomicUsize::new(0)),
            first: ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "No auth credentials found" }
            })),
            second: ResponseTemplate::new(200).set_body_json(ok_body()),
        })
        .mount(&server)
        .await;

    let gateway = ProviderGateway::with_config(adapter(&server), fast_retry());
    let err = gateway.chat(request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized { .. }));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}
