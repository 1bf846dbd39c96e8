use crate::stored_object;

stored_object!(ChatSession, "chat_session", {});

impl ChatSession {
    /// A session record keyed by the client-supplied session id.
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }
}
