use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

/// Service banner with the endpoint map.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "knowledge-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "upload": "POST /api/upload",
            "ingest": "POST /api/ingest",
            "update_document": "PUT /api/document/{document_id}",
            "delete_document": "DELETE /api/document/{document_id}",
            "match_entity": "POST /api/match-entity",
            "stats": "GET /api/stats",
            "clear": "DELETE /api/clear",
            "health": "GET /health",
        }
    }))
}

/// Health probe: reports the vector store stats alongside liveness.
pub async fn health(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.documents.stats().await?;

    Ok(Json(json!({
        "status": "healthy",
        "vector_store": stats,
    })))
}
