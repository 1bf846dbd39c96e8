use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

pub async fn stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.documents.stats().await?;
    Ok(Json(stats))
}

/// Drops every document and chunk from the knowledge base.
pub async fn clear(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    state.documents.clear().await?;

    info!("Knowledge base cleared via API");

    Ok(Json(json!({
        "success": true,
        "message": "Knowledge base cleared",
    })))
}
