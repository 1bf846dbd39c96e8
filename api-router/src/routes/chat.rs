use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

fn default_use_rag() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

pub async fn chat(
    State(state): State<ApiState>,
    Json(input): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .orchestrator
        .chat(&input.message, input.session_id, input.use_rag)
        .await?;

    Ok(Json(reply))
}
