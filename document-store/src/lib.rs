//! Document lifecycle against the vector store: chunking, embedding,
//! create/update/delete, and file text extraction for uploads.
pub mod chunking;
pub mod extraction;
pub mod store;

pub use store::{DocumentStore, IngestReceipt, StoreStats};
