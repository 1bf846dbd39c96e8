//! Shared foundation for the entity-aware RAG chat service: errors,
//! configuration, SurrealDB storage types, embeddings, the entity
//! catalog and the chat session store.
pub mod entity;
pub mod error;
pub mod session;
pub mod storage;
pub mod utils;
