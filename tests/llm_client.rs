//! Integration tests for the generation client against a mock server.
//!
//! Exercises the real HTTP stack: request shape, batch JSON parsing, and
//! NDJSON streaming with malformed lines in the stream.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::json;
use tokio::sync::mpsc;
use valet::config::LlmConfig;
use valet::llm::LlmClient;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LlmClient {
    let config = LlmConfig {
        api_url: server.uri(),
        model: "test-model".to_owned(),
        ..Default::default()
    };
    LlmClient::new(&config)
}

#[tokio::test]
async fn batch_generation_returns_response_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "response": "Hello from the model.",
            "done": true,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.generate("say hello").await.unwrap();
    assert_eq!(response, "Hello from the model.");
}

#[tokio::test]
async fn batch_request_carries_sampling_options() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "options": {
                "num_predict": 512,
                "temperature": 0.7,
                "top_p": 0.9,
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "ok", "done": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.generate("anything").await.unwrap();
}

#[tokio::test]
async fn streaming_concatenates_tokens() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"response\":\"Hel\",\"done\":false}\n",
        "{\"response\":\"lo. \",\"done\":false}\n",
        "{\"response\":\"Bye.\",\"done\":true}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (tx, mut rx) = mpsc::channel(64);
    let collector = tokio::spawn(async move {
        let mut tokens = Vec::new();
        while let Some(token) = rx.recv().await {
            tokens.push(token);
        }
        tokens
    });

    let full = client.generate_streaming("stream it", tx).await.unwrap();
    let tokens = collector.await.unwrap();

    assert_eq!(full, "Hello. Bye.");
    assert_eq!(tokens.concat(), full);
    assert_eq!(tokens, vec!["Hel", "lo. ", "Bye."]);
}

#[tokio::test]
async fn streaming_skips_malformed_lines() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"response\":\"Good\",\"done\":false}\n",
        "this is not json\n",
        "{\"response\":\" data\",\"done\":true}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (tx, mut rx) = mpsc::channel(64);
    let collector = tokio::spawn(async move {
        let mut tokens = Vec::new();
        while let Some(token) = rx.recv().await {
            tokens.push(token);
        }
        tokens
    });

    let full = client.generate_streaming("go", tx).await.unwrap();
    assert_eq!(full, "Good data");
    assert_eq!(collector.await.unwrap(), vec!["Good", " data"]);
}

#[tokio::test]
async fn streaming_stops_at_done_marker() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"response\":\"only this\",\"done\":true}\n",
        "{\"response\":\"never this\",\"done\":false}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (tx, _rx) = mpsc::channel(64);
    let full = client.generate_streaming("go", tx).await.unwrap();
    assert_eq!(full, "only this");
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    // Nothing listens on this port.
    let config = LlmConfig {
        api_url: "http://127.0.0.1:1".to_owned(),
        ..Default::default()
    };
    let client = LlmClient::new(&config);
    assert!(client.generate("hello").await.is_err());
}

#[tokio::test]
async fn missing_response_field_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.generate("hello").await.is_err());
}
