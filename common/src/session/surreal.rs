use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            chat_session::ChatSession,
            chat_turn::{ChatTurn, TurnRole},
            StoredObject,
        },
    },
};

use super::SessionStore;

/// SurrealDB-backed session store. Turn history survives restarts;
/// expiry is judged against the session record's `updated_at`.
pub struct SurrealSessionStore {
    db: Arc<SurrealDbClient>,
    ttl: Duration,
}

impl SurrealSessionStore {
    pub fn new(db: Arc<SurrealDbClient>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    fn cutoff(&self) -> chrono::DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        Utc::now() - ttl
    }

    async fn delete_session_with_turns(&self, session_id: &str) -> Result<(), AppError> {
        self.db
            .client
            .query("DELETE type::thing('chat_session', $id); DELETE chat_turn WHERE session_id = $id;")
            .bind(("id", session_id.to_owned()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SurrealSessionStore {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, AppError> {
        let session: Option<ChatSession> = self.db.get_item(session_id).await?;
        let Some(session) = session else {
            return Ok(Vec::new());
        };

        if session.updated_at < self.cutoff() {
            self.delete_session_with_turns(session_id).await?;
            return Ok(Vec::new());
        }

        let turns: Vec<ChatTurn> = self
            .db
            .client
            .query("SELECT * FROM type::table($table) WHERE session_id = $session_id ORDER BY created_at")
            .bind(("table", ChatTurn::table_name()))
            .bind(("session_id", session_id.to_owned()))
            .await?
            .take(0)?;

        Ok(turns)
    }

    async fn append(
        &self,
        session_id: &str,
        role: TurnRole,
        content: String,
    ) -> Result<(), AppError> {
        let existing: Option<ChatSession> = self.db.get_item(session_id).await?;
        match existing {
            // An expired session must not have its old turns revived by
            // a fresh append, so evict it first.
            Some(session) if session.updated_at < self.cutoff() => {
                self.delete_session_with_turns(session_id).await?;
                self.db
                    .store_item(ChatSession::new(session_id.to_string()))
                    .await?;
            }
            Some(_) => {
                self.db
                    .client
                    .query("UPDATE type::thing('chat_session', $id) SET updated_at = time::now()")
                    .bind(("id", session_id.to_owned()))
                    .await?;
            }
            None => {
                self.db
                    .store_item(ChatSession::new(session_id.to_string()))
                    .await?;
            }
        }

        self.db
            .store_item(ChatTurn::new(session_id.to_string(), role, content))
            .await?;

        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize, AppError> {
        let expired: Vec<ChatSession> = self
            .db
            .client
            .query("SELECT * FROM chat_session WHERE updated_at < $cutoff")
            .bind(("cutoff", surrealdb::sql::Datetime::from(self.cutoff())))
            .await?
            .take(0)?;

        for session in &expired {
            self.delete_session_with_turns(&session.id).await?;
        }

        Ok(expired.len())
    }
}
