use axum::{extract::State, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart, TypedMultipartError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "10000000")]
    pub file: FieldData<NamedTempFile>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub file_id: String,
    pub filename: String,
    pub chunks_created: usize,
}

/// Multipart file upload: extract text, chunk, embed and store.
pub async fn upload_file(
    State(state): State<ApiState>,
    upload: Result<TypedMultipart<UploadParams>, TypedMultipartError>,
) -> Result<impl IntoResponse, ApiError> {
    let TypedMultipart(input) = upload.map_err(|err| match err {
        TypedMultipartError::FieldTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
        other => ApiError::ValidationError(other.to_string()),
    })?;

    let filename = input
        .file
        .metadata
        .file_name
        .clone()
        .ok_or_else(|| ApiError::ValidationError("Uploaded file has no filename".to_string()))?;

    info!(filename, "Received file upload");

    let receipt = state
        .documents
        .ingest_file(
            input.file.contents.path(),
            &filename,
            json!({ "source": "upload" }),
        )
        .await?;

    Ok(Json(IngestResponse {
        success: true,
        message: format!("Successfully processed {filename}"),
        file_id: receipt.document_id,
        filename: receipt.document_name,
        chunks_created: receipt.chunks_created,
    }))
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub content: String,
    pub document_name: Option<String>,
    pub metadata: Option<Value>,
}

/// Direct text ingestion without a file.
pub async fn ingest_text(
    State(state): State<ApiState>,
    Json(input): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = input
        .document_name
        .unwrap_or_else(|| format!("api_ingest_{}", Uuid::new_v4()));
    let metadata = input.metadata.unwrap_or_else(|| json!({ "source": "api" }));

    info!(document_name = name, "Received text ingestion request");

    let receipt = state.documents.create(&input.content, &name, metadata).await?;

    Ok(Json(IngestResponse {
        success: true,
        message: format!("Successfully processed {name}"),
        file_id: receipt.document_id,
        filename: receipt.document_name,
        chunks_created: receipt.chunks_created,
    }))
}
