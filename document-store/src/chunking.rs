use common::error::AppError;
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits document text into overlapping chunks, character-sized.
/// Defaults (1000/200) follow the splitter the ingestion API always
/// used, so re-ingesting existing documents keeps their chunk counts.
pub fn prepare_chunks(
    text: &str,
    capacity: usize,
    overlap: usize,
) -> Result<Vec<String>, AppError> {
    if capacity == 0 {
        return Err(AppError::Validation(
            "chunk capacity must be greater than zero".into(),
        ));
    }

    if overlap >= capacity {
        return Err(AppError::Validation(format!(
            "chunk overlap of {overlap} must be smaller than the chunk capacity of {capacity}"
        )));
    }

    let chunk_config = ChunkConfig::new(capacity)
        .with_overlap(overlap)
        .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?;
    let splitter = TextSplitter::new(chunk_config);

    Ok(splitter.chunks(text).map(str::to_owned).collect())
}
