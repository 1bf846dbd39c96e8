use std::sync::Arc;

use chat_pipeline::ChatOrchestrator;
use common::{storage::db::SurrealDbClient, utils::config::AppConfig};
use document_store::DocumentStore;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub documents: Arc<DocumentStore>,
    pub orchestrator: Arc<ChatOrchestrator>,
}

impl ApiState {
    pub fn new(
        db: Arc<SurrealDbClient>,
        config: AppConfig,
        documents: Arc<DocumentStore>,
        orchestrator: Arc<ChatOrchestrator>,
    ) -> Self {
        Self {
            db,
            config,
            documents,
            orchestrator,
        }
    }
}
