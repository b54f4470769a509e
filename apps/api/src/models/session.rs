use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::progress::Section;
use crate::models::document::{CanonicalDocument, DocType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of the conversation. History is append-only; both the user's
/// message and the assistant's reply are recorded each round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        ChatTurn {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ChatTurn {
            role: TurnRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The per-session state the orchestrator owns. One document snapshot, one
/// append-only history, recomputed section bookkeeping. The live model
/// conversation is NOT part of this — it is always reconstructible from
/// `history`, which is why cache eviction can never lose document data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub doc_type: DocType,
    pub status: SessionStatus,
    pub current_document: CanonicalDocument,
    pub history: Vec<ChatTurn>,
    pub collected_sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(user_id: Uuid, doc_type: DocType) -> Self {
        let now = Utc::now();
        ConversationSession {
            session_id: Uuid::new_v4(),
            user_id,
            doc_type,
            status: SessionStatus::Active,
            current_document: CanonicalDocument::default(),
            history: Vec::new(),
            collected_sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The question the assistant asked most recently, derived from the
    /// history rather than assumed to sit at any particular index.
    pub fn last_question(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::Assistant)
            .map(|t| t.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_question_is_most_recent_assistant_turn() {
        let mut session = ConversationSession::new(Uuid::new_v4(), DocType::Cv);
        assert_eq!(session.last_question(), None);

        session.history.push(ChatTurn::assistant("First question?"));
        session.history.push(ChatTurn::user("An answer."));
        session.history.push(ChatTurn::assistant("Second question?"));
        session.history.push(ChatTurn::user("Another answer."));

        assert_eq!(session.last_question(), Some("Second question?"));
    }
}
