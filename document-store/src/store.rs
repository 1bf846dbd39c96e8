use std::{path::Path, sync::Arc};

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{document::Document, document_chunk::DocumentChunk},
    },
    utils::embedding::EmbeddingProvider,
};
use serde_json::Value;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::info;
use uuid::Uuid;

use crate::{chunking::prepare_chunks, extraction::extract_text};

/// Outcome of an ingest or update, echoed back to API callers.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub document_id: String,
    pub document_name: String,
    pub chunks_created: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub total_chunks: usize,
    pub total_documents: usize,
    pub status: String,
}

/// Owns the chunk lifecycle per document id: splits content into
/// overlapping chunks, embeds them, and keeps the document record and
/// its chunk set in sync. Updates replace the chunk set wholesale
/// inside a single transaction, deletes leave no orphans.
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<SurrealDbClient>,
    embedding: Arc<EmbeddingProvider>,
    chunk_capacity: usize,
    chunk_overlap: usize,
}

impl DocumentStore {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedding: Arc<EmbeddingProvider>,
        chunk_capacity: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            db,
            embedding,
            chunk_capacity,
            chunk_overlap,
        }
    }

    /// Chunks, embeds and stores new content under a fresh document id.
    pub async fn create(
        &self,
        content: &str,
        name: &str,
        metadata: Value,
    ) -> Result<IngestReceipt, AppError> {
        let document_id = Uuid::new_v4().to_string();
        let chunks = self.embedded_chunks(&document_id, content, name).await?;
        let chunk_count = chunks.len();

        self.db
            .client
            .query(
                "BEGIN TRANSACTION;
                 CREATE type::thing('document', $doc_id) SET
                     name = $name,
                     metadata = $metadata,
                     chunk_count = $chunk_count,
                     created_at = time::now(),
                     updated_at = time::now();
                 INSERT INTO document_chunk $chunks;
                 COMMIT TRANSACTION;",
            )
            .bind(("doc_id", document_id.clone()))
            .bind(("name", name.to_owned()))
            .bind(("metadata", metadata))
            .bind(("chunk_count", chunk_count))
            .bind(("chunks", chunks))
            .await?;

        info!(
            document_id = %document_id,
            document_name = %name,
            chunks_created = chunk_count,
            "Stored new document"
        );

        Ok(IngestReceipt {
            document_id,
            document_name: name.to_owned(),
            chunks_created: chunk_count,
        })
    }

    /// Replaces a document's content. The old chunk set is deleted and
    /// the new one inserted in the same transaction, so readers never
    /// observe a partial replace. The document id is preserved.
    pub async fn update(
        &self,
        document_id: &str,
        content: &str,
        name: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<IngestReceipt, AppError> {
        let existing = Document::get_required(document_id, &self.db).await?;

        let document_name = name.unwrap_or(&existing.name).to_owned();
        let metadata = metadata.unwrap_or(existing.metadata);
        let chunks = self
            .embedded_chunks(document_id, content, &document_name)
            .await?;
        let chunk_count = chunks.len();

        self.db
            .client
            .query(
                "BEGIN TRANSACTION;
                 DELETE document_chunk WHERE source_id = $doc_id;
                 INSERT INTO document_chunk $chunks;
                 UPDATE type::thing('document', $doc_id) SET
                     name = $name,
                     metadata = $metadata,
                     chunk_count = $chunk_count,
                     updated_at = time::now();
                 COMMIT TRANSACTION;",
            )
            .bind(("doc_id", document_id.to_owned()))
            .bind(("name", document_name.clone()))
            .bind(("metadata", metadata))
            .bind(("chunk_count", chunk_count))
            .bind(("chunks", chunks))
            .await?;

        info!(
            document_id = %document_id,
            chunks_created = chunk_count,
            "Replaced document content"
        );

        Ok(IngestReceipt {
            document_id: document_id.to_owned(),
            document_name,
            chunks_created: chunk_count,
        })
    }

    /// Removes the document and every one of its chunks, returning the
    /// deleted chunk count.
    pub async fn delete(&self, document_id: &str) -> Result<usize, AppError> {
        Document::get_required(document_id, &self.db).await?;
        let chunk_count = DocumentChunk::count_by_source_id(document_id, &self.db).await?;

        self.db
            .client
            .query(
                "BEGIN TRANSACTION;
                 DELETE type::thing('document', $doc_id);
                 DELETE document_chunk WHERE source_id = $doc_id;
                 COMMIT TRANSACTION;",
            )
            .bind(("doc_id", document_id.to_owned()))
            .await?;

        info!(
            document_id = %document_id,
            chunks_deleted = chunk_count,
            "Deleted document"
        );

        Ok(chunk_count)
    }

    pub async fn stats(&self) -> Result<StoreStats, AppError> {
        let total_chunks = DocumentChunk::count_all(&self.db).await?;
        let total_documents = Document::count_all(&self.db).await?;

        Ok(StoreStats {
            total_chunks,
            total_documents,
            status: if total_chunks > 0 { "active" } else { "empty" }.to_owned(),
        })
    }

    pub async fn has_chunks(&self) -> Result<bool, AppError> {
        Ok(DocumentChunk::count_all(&self.db).await? > 0)
    }

    /// Drops every document and chunk from the knowledge base.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.db.drop_table::<DocumentChunk>().await?;
        self.db.drop_table::<Document>().await?;
        info!("Cleared knowledge base");
        Ok(())
    }

    /// Extracts text from an uploaded file and stores it as a new document.
    pub async fn ingest_file(
        &self,
        path: &Path,
        filename: &str,
        metadata: Value,
    ) -> Result<IngestReceipt, AppError> {
        let content = extract_text(path, filename).await?;
        self.create(&content, filename, metadata).await
    }

    async fn embedded_chunks(
        &self,
        document_id: &str,
        content: &str,
        document_name: &str,
    ) -> Result<Vec<DocumentChunk>, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Document content must not be empty".into(),
            ));
        }

        let chunk_texts = prepare_chunks(content, self.chunk_capacity, self.chunk_overlap)?;

        let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);
        let embeddings = Retry::spawn(retry_strategy, || {
            self.embedding.embed_batch(chunk_texts.clone())
        })
        .await?;

        if embeddings.len() != chunk_texts.len() {
            return Err(AppError::InternalError(format!(
                "Embedding count {} does not match chunk count {}",
                embeddings.len(),
                chunk_texts.len()
            )));
        }

        Ok(chunk_texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                DocumentChunk::new(
                    document_id.to_owned(),
                    chunk,
                    index,
                    embedding,
                    document_name.to_owned(),
                )
            })
            .collect())
    }
}
