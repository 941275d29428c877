mod common;

use std::sync::{atomic::Ordering, Arc};

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{router_with, send, StubEmbeddingUseCase, TEST_BODY_LIMIT};
use ingest_domain::DomainError;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn health_reports_model_state() -> TestResult {
    let embedding = Arc::new(StubEmbeddingUseCase::ready());
    let (status, body) = send(router_with(embedding.clone()), Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "model_loaded": true }));

    embedding.loaded.store(false, Ordering::SeqCst);
    let (status, body) = send(router_with(embedding), Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
    Ok(())
}

#[tokio::test]
async fn extract_transcript_returns_segments() -> TestResult {
    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let (status, body) = send(
        router,
        Method::POST,
        "/extract-transcript",
        Some(r#"{"video_id":"abc123"}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "en");
    assert!(body["error"].is_null());
    assert_eq!(body["segments"][0]["text"], "Hello world");
    assert_eq!(body["segments"][0]["duration"], 1.2);
    assert_eq!(body["segments"][1]["start"], 1.2);
    Ok(())
}

#[tokio::test]
async fn transcript_domain_failure_is_still_200() -> TestResult {
    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let (status, body) = send(
        router,
        Method::POST,
        "/extract-transcript",
        Some(r#"{"video_id":"disabled"}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["segments"], json!([]));
    assert_eq!(body["error"], "Transcripts are disabled for this video.");
    Ok(())
}

#[tokio::test]
async fn unexpected_transcript_error_is_500() -> TestResult {
    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let (status, body) = send(
        router,
        Method::POST,
        "/extract-transcript",
        Some(r#"{"video_id":"explode"}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("caption source crashed"));
    Ok(())
}

#[tokio::test]
async fn empty_or_missing_video_id_is_rejected() -> TestResult {
    for payload in [r#"{"video_id":""}"#, r#"{}"#, "not json"] {
        let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
        let (status, body) = send(router, Method::POST, "/extract-transcript", Some(payload)).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {payload}");
        assert!(body["error"].is_string(), "payload {payload}");
    }
    Ok(())
}

#[tokio::test]
async fn generate_embeddings_returns_vectors() -> TestResult {
    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let (status, body) = send(
        router,
        Method::POST,
        "/generate-embeddings",
        Some(r#"{"texts":["a","bb","ccc"]}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["dimensions"], 384);
    assert!(body["error"].is_null());
    let embeddings = body["embeddings"].as_array().cloned().unwrap_or_default();
    assert_eq!(embeddings.len(), 3);
    assert_eq!(embeddings[2].as_array().map(Vec::len), Some(384));
    assert_eq!(embeddings[1][0], 2.0);
    Ok(())
}

#[tokio::test]
async fn empty_text_list_is_a_boundary_failure() -> TestResult {
    let embedding = Arc::new(StubEmbeddingUseCase::ready());
    let (status, body) = send(
        router_with(embedding.clone()),
        Method::POST,
        "/generate-embeddings",
        Some(r#"{"texts":[]}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": false,
            "embeddings": [],
            "error": "No texts provided",
            "dimensions": 384
        })
    );
    assert_eq!(embedding.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn embedding_failures_map_to_status_codes() -> TestResult {
    let cases = [
        (
            DomainError::internal_error("tensor shape mismatch"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            DomainError::model_not_ready("still loading"),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        (
            DomainError::invalid_input("text too long"),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    ];

    for (error, expected) in cases {
        let router = router_with(Arc::new(StubEmbeddingUseCase::failing(error)));
        let (status, body) = send(
            router,
            Method::POST,
            "/generate-embeddings",
            Some(r#"{"texts":["hello"]}"#),
        )
        .await?;
        assert_eq!(status, expected);
        assert!(body["error"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn oversized_bodies_are_refused() -> TestResult {
    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let huge = format!(r#"{{"texts":["{}"]}}"#, "x".repeat(TEST_BODY_LIMIT + 1));
    let (status, body) = send(router, Method::POST, "/generate-embeddings", Some(&huge)).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn cors_allows_any_origin() -> TestResult {
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::ServiceExt;

    let router = router_with(Arc::new(StubEmbeddingUseCase::ready()));
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    Ok(())
}
