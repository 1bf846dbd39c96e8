use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    storage::types::chat_turn::{ChatTurn, TurnRole},
};

use super::SessionStore;

struct MemorySession {
    turns: Vec<ChatTurn>,
    expires_at: Instant,
}

/// In-process session store with lazy TTL eviction. Sessions are
/// independent, so a single RwLock over the map is sufficient.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, MemorySession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, AppError> {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(session) if session.expires_at > now => Ok(session.turns.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn append(
        &self,
        session_id: &str,
        role: TurnRole,
        content: String,
    ) -> Result<(), AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| MemorySession {
                turns: Vec::new(),
                expires_at: now + self.ttl,
            });

        // An expired entry that was never evicted starts fresh
        if session.expires_at <= now {
            session.turns.clear();
        }

        session
            .turns
            .push(ChatTurn::new(session_id.to_string(), role, content));
        session.expires_at = now + self.ttl;

        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize, AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}
