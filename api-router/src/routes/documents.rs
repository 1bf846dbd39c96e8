use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub document_id: String,
    pub content: String,
    pub document_name: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateDocumentResponse {
    pub success: bool,
    pub message: String,
    pub file_id: String,
    pub chunks_created: usize,
}

/// Replaces a document's content in place, re-chunking and re-embedding
/// under the same id.
pub async fn update_document(
    State(state): State<ApiState>,
    Path(document_id): Path<String>,
    Json(input): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.document_id != document_id {
        return Err(ApiError::ValidationError(format!(
            "Document id in path ({document_id}) does not match body ({})",
            input.document_id
        )));
    }

    let receipt = state
        .documents
        .update(
            &document_id,
            &input.content,
            input.document_name.as_deref(),
            input.metadata,
        )
        .await?;

    info!(
        document_id,
        chunks_created = receipt.chunks_created,
        "Updated document"
    );

    Ok(Json(UpdateDocumentResponse {
        success: true,
        message: format!("Successfully updated {}", receipt.document_name),
        file_id: receipt.document_id,
        chunks_created: receipt.chunks_created,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponse {
    pub success: bool,
    pub message: String,
    pub document_id: String,
    pub chunks_deleted: usize,
}

pub async fn delete_document(
    State(state): State<ApiState>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chunks_deleted = state.documents.delete(&document_id).await?;

    info!(document_id, chunks_deleted, "Deleted document");

    Ok(Json(DeleteDocumentResponse {
        success: true,
        message: format!("Successfully deleted document {document_id}"),
        document_id,
        chunks_deleted,
    }))
}
