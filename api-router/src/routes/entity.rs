use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct MatchEntityRequest {
    pub query: String,
    pub session_id: Option<String>,
}

/// Ranks catalog entities against the query. Methodology questions get
/// the fixed explanation instead of entity matches.
pub async fn match_entity(
    State(state): State<ApiState>,
    Json(input): Json<MatchEntityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .orchestrator
        .match_entities(&input.query, input.session_id.as_deref())
        .await?;

    Ok(Json(outcome))
}
