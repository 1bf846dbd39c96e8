use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(DocumentChunk, "document_chunk", {
    source_id: String,
    chunk: String,
    chunk_index: usize,
    embedding: Vec<f32>,
    document_name: String
});

#[derive(serde::Deserialize)]
struct CountRow {
    count: usize,
}

impl DocumentChunk {
    pub fn new(
        source_id: String,
        chunk: String,
        chunk_index: usize,
        embedding: Vec<f32>,
        document_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            source_id,
            chunk,
            chunk_index,
            embedding,
            document_name,
        }
    }

    pub async fn delete_by_source_id(
        source_id: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        db.client
            .query("DELETE type::table($table) WHERE source_id = $source_id")
            .bind(("table", Self::table_name()))
            .bind(("source_id", source_id.to_owned()))
            .await?;

        Ok(())
    }

    pub async fn count_by_source_id(
        source_id: &str,
        db: &SurrealDbClient,
    ) -> Result<usize, AppError> {
        let row: Option<CountRow> = db
            .client
            .query("SELECT count() FROM type::table($table) WHERE source_id = $source_id GROUP ALL")
            .bind(("table", Self::table_name()))
            .bind(("source_id", source_id.to_owned()))
            .await?
            .take(0)?;

        Ok(row.map_or(0, |r| r.count))
    }

    pub async fn count_all(db: &SurrealDbClient) -> Result<usize, AppError> {
        let row: Option<CountRow> = db
            .client
            .query("SELECT count() FROM type::table($table) GROUP ALL")
            .bind(("table", Self::table_name()))
            .await?
            .take(0)?;

        Ok(row.map_or(0, |r| r.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source_id: &str, index: usize) -> DocumentChunk {
        DocumentChunk::new(
            source_id.to_string(),
            format!("chunk {index}"),
            index,
            vec![0.1, 0.2, 0.3],
            "doc.txt".to_string(),
        )
    }

    #[tokio::test]
    async fn test_counts_and_delete_by_source() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        for i in 0..3 {
            db.store_item(chunk("doc_a", i)).await.expect("store");
        }
        for i in 0..2 {
            db.store_item(chunk("doc_b", i)).await.expect("store");
        }

        assert_eq!(DocumentChunk::count_all(&db).await.expect("count"), 5);
        assert_eq!(
            DocumentChunk::count_by_source_id("doc_a", &db)
                .await
                .expect("count"),
            3
        );

        DocumentChunk::delete_by_source_id("doc_a", &db)
            .await
            .expect("delete");

        // No orphans: only doc_b chunks remain
        assert_eq!(DocumentChunk::count_all(&db).await.expect("count"), 2);
        assert_eq!(
            DocumentChunk::count_by_source_id("doc_a", &db)
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn test_count_empty_table() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        assert_eq!(DocumentChunk::count_all(&db).await.expect("count"), 0);
    }
}
