#![allow(clippy::module_name_repetitions)]
use uuid::Uuid;

use crate::stored_object;

#[derive(Deserialize, Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

stored_object!(ChatTurn, "chat_turn", {
    session_id: String,
    role: TurnRole,
    content: String
});

impl ChatTurn {
    pub fn new(session_id: String, role: TurnRole, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            session_id,
            role,
            content,
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "User"),
            TurnRole::Assistant => write!(f, "Assistant"),
            TurnRole::System => write!(f, "System"),
        }
    }
}

impl fmt::Display for ChatTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

// helper function to format a vector of turns for prompt context
pub fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{turn}"))
        .collect::<Vec<String>>()
        .join("\n")
}
