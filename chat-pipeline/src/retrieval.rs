use common::{
    error::AppError, storage::db::SurrealDbClient, utils::embedding::EmbeddingProvider,
};
use serde::Deserialize;
use tracing::debug;

// A supporting chunk plus its similarity score, as used by prompts
// and cited sources. Embeddings stay in the database.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub source_id: String,
    pub chunk: String,
    pub chunk_index: usize,
    pub document_name: String,
    #[serde(rename = "distance")]
    pub score: f32,
}

/// Distances from the HNSW index are lower-is-better; callers want a
/// similarity in (0, 1].
pub fn relevance_from_distance(distance: f32) -> f32 {
    if distance > 0.0 {
        1.0 / (1.0 + distance)
    } else {
        1.0
    }
}

/// Embeds the query and returns the `top_k` nearest chunks by cosine
/// distance, best first, with distances already converted to
/// similarity scores.
pub async fn retrieve_similar_chunks(
    db: &SurrealDbClient,
    embedding_provider: &EmbeddingProvider,
    query: &str,
    top_k: usize,
) -> Result<Vec<RetrievedChunk>, AppError> {
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let query_embedding = embedding_provider.embed(query).await?;

    let mut rows: Vec<RetrievedChunk> = db
        .client
        .query(format!(
            "SELECT meta::id(id) AS id, source_id, chunk, chunk_index, document_name, \
             vector::distance::knn() AS distance FROM document_chunk \
             WHERE embedding <|{top_k},40|> $query_embedding ORDER BY distance"
        ))
        .bind(("query_embedding", query_embedding))
        .await?
        .take(0)?;

    for row in &mut rows {
        row.score = relevance_from_distance(row.score);
    }

    debug!(query, results = rows.len(), "Chunk similarity search");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::document_chunk::DocumentChunk;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn setup_db() -> Arc<SurrealDbClient> {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = Arc::new(
            SurrealDbClient::memory(namespace, database)
                .await
                .expect("Failed to start in-memory surrealdb"),
        );

        db.ensure_initialized(3)
            .await
            .expect("Failed to initialize schema");

        db
    }

    fn chunk_with_embedding(text: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk::new(
            "doc".to_string(),
            text.to_string(),
            0,
            embedding,
            "doc.txt".to_string(),
        )
    }

    #[test]
    fn test_relevance_from_distance() {
        assert!((relevance_from_distance(0.0) - 1.0).abs() < f32::EPSILON);
        assert!((relevance_from_distance(1.0) - 0.5).abs() < f32::EPSILON);
        assert!(relevance_from_distance(0.1) > relevance_from_distance(0.9));
    }

    #[tokio::test]
    async fn test_retrieval_returns_scored_chunks() {
        let db = setup_db().await;

        db.store_item(chunk_with_embedding("close match", vec![0.9, 0.1, 0.0]))
            .await
            .expect("store");
        db.store_item(chunk_with_embedding("far match", vec![0.0, 0.1, 0.9]))
            .await
            .expect("store");

        let provider = EmbeddingProvider::new_hashed(3);

        let results = retrieve_similar_chunks(&db, &provider, "anything", 2)
            .await
            .expect("retrieval should succeed");

        assert_eq!(results.len(), 2);
        // Best first, scores already similarity-shaped
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.score > 0.0 && r.score <= 1.0));
        assert_eq!(results[0].document_name, "doc.txt");
    }

    #[tokio::test]
    async fn test_retrieval_empty_store_returns_nothing() {
        let db = setup_db().await;
        let provider = EmbeddingProvider::new_hashed(3);

        let results = retrieve_similar_chunks(&db, &provider, "anything", 3)
            .await
            .expect("retrieval should succeed");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_top_k_zero_short_circuits() {
        let db = setup_db().await;
        let provider = EmbeddingProvider::new_hashed(3);

        let results = retrieve_similar_chunks(&db, &provider, "anything", 0)
            .await
            .expect("retrieval should succeed");
        assert!(results.is_empty());
    }
}
