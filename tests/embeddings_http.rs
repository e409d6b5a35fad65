//! OpenAI embedding client tests against a mock HTTP server.

use auditgraph::config::EmbeddingConfig;
use auditgraph::embeddings::{EmbeddingError, EmbeddingProvider, OpenAiEmbedder};
use httpmock::prelude::*;
use serde_json::json;

fn embedder_for(server: &MockServer) -> OpenAiEmbedder {
    OpenAiEmbedder::new(
        EmbeddingConfig::default()
            .with_api_key("test-key")
            .with_api_base(server.base_url()),
    )
    .unwrap()
}

#[tokio::test]
async fn batch_embeddings_come_back_in_input_order() {
    let server = MockServer::start_async().await;
    // Vectors deliberately delivered out of order; the client must
    // restore input order from the per-item index.
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_includes(r#"{"model":"text-embedding-ada-002"}"#);
            then.status(200).json_body(json!({
                "object": "list",
                "model": "text-embedding-ada-002",
                "data": [
                    { "object": "embedding", "index": 1, "embedding": [0.5, 0.5] },
                    { "object": "embedding", "index": 0, "embedding": [0.1, 0.2] }
                ]
            }));
        })
        .await;

    let embedder = embedder_for(&server);
    let vectors = embedder
        .embed_batch(&["first doc".to_string(), "second doc".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.5, 0.5]]);
}

#[tokio::test]
async fn single_query_embedding_round_trips() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": [1.0, 2.0, 3.0] }
                ]
            }));
        })
        .await;

    let embedder = embedder_for(&server);
    let vector = embedder.embed("what did the auditor conclude?").await.unwrap();
    assert_eq!(vector, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn service_errors_pass_through_with_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(429).body("rate limited");
        })
        .await;

    let embedder = embedder_for(&server);
    match embedder.embed("anything").await {
        Err(EmbeddingError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn short_responses_are_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;

    let embedder = embedder_for(&server);
    match embedder.embed("anything").await {
        Err(EmbeddingError::EmptyResponse) => {}
        other => panic!("expected EmptyResponse, got {other:?}"),
    }
}

#[test]
fn missing_api_key_fails_at_construction() {
    let result = OpenAiEmbedder::new(EmbeddingConfig::default());
    assert!(matches!(result, Err(EmbeddingError::MissingApiKey)));
}

#[tokio::test]
async fn empty_batch_never_touches_the_network() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;

    let embedder = embedder_for(&server);
    let vectors = embedder.embed_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
    assert_eq!(mock.hits_async().await, 0);
}
