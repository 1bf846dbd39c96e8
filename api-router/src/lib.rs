use std::time::Duration;

use api_state::ApiState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

pub mod api_state;
pub mod error;
mod routes;

/// Maximum accepted upload file size; the body limit leaves headroom
/// for multipart framing so the per-field limit is the one that trips.
const MAX_UPLOAD_BYTES: usize = 10_000_000;
const UPLOAD_BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Builds the full REST surface over the shared state.
pub fn api_router(state: ApiState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_seconds);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .route("/api/chat", post(routes::chat::chat))
        .route(
            "/api/upload",
            post(routes::upload::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT_BYTES)),
        )
        .route("/api/ingest", post(routes::upload::ingest_text))
        .route(
            "/api/document/{document_id}",
            put(routes::documents::update_document).delete(routes::documents::delete_document),
        )
        .route("/api/match-entity", post(routes::entity::match_entity))
        .route("/api/stats", get(routes::admin::stats))
        .route("/api/clear", delete(routes::admin::clear))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        Router,
    };
    use chat_pipeline::{ChatOrchestrator, EntityMatcher};
    use common::{
        entity::EntityCatalog,
        session::MemorySessionStore,
        storage::db::SurrealDbClient,
        utils::{config::AppConfig, embedding::EmbeddingProvider},
    };
    use document_store::DocumentStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    const EMBEDDING_DIM: usize = 8;

    const CATALOG_JSON: &str = r#"{
        "entities": [
            {"name": "State Street", "shortCode": "STT", "category": "Custodian"},
            {"name": "BlackRock", "shortCode": "BLK", "category": "Asset Manager"}
        ]
    }"#;

    async fn test_app() -> Router {
        let db = Arc::new(
            SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
                .await
                .expect("in-memory surrealdb"),
        );
        db.ensure_initialized(EMBEDDING_DIM)
            .await
            .expect("schema init");

        let config = AppConfig::default();
        let embedding = Arc::new(EmbeddingProvider::new_hashed(EMBEDDING_DIM));
        let documents = Arc::new(DocumentStore::new(
            Arc::clone(&db),
            Arc::clone(&embedding),
            config.chunk_capacity,
            config.chunk_overlap,
        ));

        let catalog =
            Arc::new(EntityCatalog::from_json_str(CATALOG_JSON).expect("catalog fixture"));
        let matcher = Arc::new(EntityMatcher::new(catalog).expect("matcher"));
        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key("test-key")
                .with_api_base("https://example.invalid/v1"),
        ));
        let orchestrator = Arc::new(ChatOrchestrator::new(
            Arc::clone(&db),
            openai_client,
            embedding,
            sessions,
            matcher,
            config.chat_model.clone(),
            config.retrieval_top_k,
        ));

        let state = crate::api_state::ApiState::new(db, config, documents, orchestrator);
        api_router(state)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_health_reports_vector_store_stats() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["vector_store"]["total_documents"], 0);
        assert_eq!(body["vector_store"]["status"], "empty");
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["endpoints"]["chat"], "POST /api/chat");
    }

    #[tokio::test]
    async fn test_ingest_then_stats() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/ingest",
                json!({"content": "State Street is a custodian bank.", "document_name": "notes.txt"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["filename"], "notes.txt");
        assert!(body["chunks_created"].as_u64().is_some_and(|n| n >= 1));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/stats")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_documents"], 1);
        assert_eq!(body["status"], "active");
    }

    #[tokio::test]
    async fn test_delete_unknown_document_is_404() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/document/no-such-id")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_update_with_mismatched_id_is_400() {
        let app = test_app().await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/document/abc",
                json!({"document_id": "def", "content": "new content"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_without_body_id_is_rejected() {
        let app = test_app().await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/document/abc",
                json!({"content": "new content"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_ingest_update_delete_roundtrip() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/ingest",
                json!({"content": "Original content about custody services."}),
            ))
            .await
            .expect("response");
        let body = json_body(response).await;
        let file_id = body["file_id"].as_str().expect("file_id").to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/document/{file_id}"),
                json!({
                    "document_id": file_id,
                    "content": "Revised content about custody services."
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["file_id"], file_id.as_str());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/document/{file_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["document_id"], file_id.as_str());
        assert!(body["chunks_deleted"].as_u64().is_some_and(|n| n >= 1));
    }

    fn multipart_upload(filename: &str, payload: &str) -> Request<Body> {
        let boundary = "upload-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {payload}\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn test_upload_stores_file_content() {
        let app = test_app().await;

        let response = app
            .oneshot(multipart_upload(
                "notes.txt",
                "BNY Mellon provides custody services.",
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["filename"], "notes.txt");
        assert!(body["chunks_created"].as_u64().is_some_and(|n| n >= 1));
    }

    #[tokio::test]
    async fn test_oversize_upload_is_413() {
        let app = test_app().await;

        let payload = "a".repeat(MAX_UPLOAD_BYTES + 1);
        let response = app
            .oneshot(multipart_upload("big.txt", &payload))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_chat_without_documents_returns_guidance() {
        let app = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"message": "What do our documents say?", "session_id": "s1"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["session_id"], "s1");
        assert!(body["sources"].as_array().is_some_and(Vec::is_empty));
        assert!(body["response"]
            .as_str()
            .is_some_and(|r| r.contains("no documents")));
    }

    #[tokio::test]
    async fn test_match_entity_methodology_question() {
        let app = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/match-entity",
                json!({"query": "How do you ensure the entities are from investment domains?"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["matches"].as_array().is_some_and(Vec::is_empty));
        assert!(body["explanation"]
            .as_str()
            .is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_clear_resets_stats() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/ingest",
                json!({"content": "Some content to clear."}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/clear")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/stats")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = json_body(response).await;
        assert_eq!(body["total_chunks"], 0);
        assert_eq!(body["total_documents"], 0);
    }
}
