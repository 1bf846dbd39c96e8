use api_router::{api_router, api_state::ApiState};
use chat_pipeline::{ChatOrchestrator, EntityMatcher};
use common::{
    entity::EntityCatalog,
    session::session_store_from_config,
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use document_store::DocumentStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );

    // Ensure tables and the vector index exist
    db.ensure_initialized(config.embedding_dimensions as usize)
        .await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        Arc::clone(&openai_client),
    ));
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    // A missing catalog file leaves entity matching running against an
    // empty catalog rather than refusing to start.
    let catalog = match EntityCatalog::load_from_path(&config.entity_catalog_path) {
        Ok(catalog) => {
            info!(
                path = config.entity_catalog_path,
                entities = catalog.len(),
                "Loaded entity catalog"
            );
            catalog
        }
        Err(e) => {
            warn!(
                path = config.entity_catalog_path,
                "Entity catalog unavailable, matching against an empty catalog: {e}"
            );
            EntityCatalog::default()
        }
    };
    let matcher = Arc::new(EntityMatcher::new(Arc::new(catalog))?);

    let sessions = session_store_from_config(&config, Arc::clone(&db));

    let documents = Arc::new(DocumentStore::new(
        Arc::clone(&db),
        Arc::clone(&embedding_provider),
        config.chunk_capacity,
        config.chunk_overlap,
    ));

    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::clone(&db),
        openai_client,
        embedding_provider,
        sessions,
        matcher,
        config.chat_model.clone(),
        config.retrieval_top_k,
    ));

    let state = ApiState::new(db, config.clone(), documents, orchestrator);
    let app = api_router(state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use common::utils::config::AppConfig;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    const EMBEDDING_DIM: usize = 8;

    async fn smoke_test_app() -> axum::Router {
        let namespace = "test_ns";
        let database = format!("test_db_{}", Uuid::new_v4());

        let config = AppConfig {
            openai_api_key: "test-key".into(),
            openai_base_url: "https://example.invalid/v1".into(),
            embedding_dimensions: EMBEDDING_DIM as u32,
            ..Default::default()
        };

        let db = Arc::new(
            SurrealDbClient::memory(namespace, &database)
                .await
                .expect("failed to start in-memory surrealdb"),
        );
        db.ensure_initialized(EMBEDDING_DIM)
            .await
            .expect("failed to initialize schema");

        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        // Hashed embeddings keep the smoke test offline
        let embedding_provider =
            Arc::new(EmbeddingProvider::new_hashed(EMBEDDING_DIM));
        let matcher =
            Arc::new(EntityMatcher::new(Arc::new(EntityCatalog::default())).expect("matcher"));
        let sessions = Arc::new(common::session::MemorySessionStore::new(
            Duration::from_secs(60),
        ));

        let documents = Arc::new(DocumentStore::new(
            Arc::clone(&db),
            Arc::clone(&embedding_provider),
            config.chunk_capacity,
            config.chunk_overlap,
        ));
        let orchestrator = Arc::new(ChatOrchestrator::new(
            Arc::clone(&db),
            openai_client,
            embedding_provider,
            sessions,
            matcher,
            config.chat_model.clone(),
            config.retrieval_top_k,
        ));

        let state = ApiState::new(db, config, documents, orchestrator);
        api_router(state)
    }

    #[tokio::test]
    async fn smoke_startup_with_in_memory_surrealdb() {
        let app = smoke_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let chat_response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"message": "hello", "use_rag": true}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("chat response");
        assert_eq!(chat_response.status(), StatusCode::OK);
    }
}
