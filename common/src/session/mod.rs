//! Conversation history keyed by a client-supplied session id.
//!
//! Sessions are created on first reference and evicted after a TTL.
//! The in-memory backing is the default and what tests use; the
//! SurrealDB backing survives restarts.
pub mod memory;
pub mod surreal;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::chat_turn::{ChatTurn, TurnRole},
    },
    utils::config::{AppConfig, SessionBackend},
};

pub use memory::MemorySessionStore;
pub use surreal::SurrealSessionStore;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the turns of the session, oldest first. An unknown or
    /// expired session id yields an empty history.
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, AppError>;

    /// Appends a turn, creating the session if it does not exist yet
    /// and refreshing its expiry.
    async fn append(
        &self,
        session_id: &str,
        role: TurnRole,
        content: String,
    ) -> Result<(), AppError>;

    /// Drops every session past its TTL, returning how many were evicted.
    async fn clear_expired(&self) -> Result<usize, AppError>;
}

pub fn session_store_from_config(
    config: &AppConfig,
    db: Arc<SurrealDbClient>,
) -> Arc<dyn SessionStore> {
    let ttl = Duration::from_secs(config.session_ttl_seconds);
    match config.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(ttl)),
        SessionBackend::Surreal => Arc::new(SurrealSessionStore::new(db, ttl)),
    }
}
