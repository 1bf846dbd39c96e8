use std::path::{Path, PathBuf};

use common::error::AppError;

/// File types the upload endpoint accepts. Anything richer
/// (DOCX/PPTX/XLSX) is out of scope for this service.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "md", "json", "pdf"];

pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Extracts plain text from an uploaded file, routed by extension.
pub async fn extract_text(path: &Path, filename: &str) -> Result<String, AppError> {
    match file_extension(filename).as_str() {
        "txt" | "md" | "json" => {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(content)
        }
        "pdf" => {
            let path: PathBuf = path.to_path_buf();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path)
                    .map_err(|e| AppError::InternalError(format!("Failed to extract PDF text: {e}")))
            })
            .await??;
            Ok(content)
        }
        other => Err(AppError::Validation(format!(
            "Unsupported file type: .{other}. Allowed: {}",
            ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}
