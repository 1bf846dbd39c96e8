use serde_json::Value;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(Document, "document", {
    name: String,
    metadata: Value,
    chunk_count: usize
});

impl Document {
    pub fn new(name: String, metadata: Value, chunk_count: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            name,
            metadata,
            chunk_count,
        }
    }

    /// Fetches a document or fails with NotFound, for the update/delete paths.
    pub async fn get_required(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        db.get_item::<Self>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
    }

    pub async fn count_all(db: &SurrealDbClient) -> Result<usize, AppError> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            count: usize,
        }

        let row: Option<CountRow> = db
            .client
            .query("SELECT count() FROM document GROUP ALL")
            .await?
            .take(0)?;

        Ok(row.map_or(0, |r| r.count))
    }
}
