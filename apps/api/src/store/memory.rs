//! In-memory store doubles for orchestrator tests. Same contracts as the
//! Postgres implementations, no database required.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::document::{NewDocument, StoredDocument};
use crate::models::session::ConversationSession;
use crate::store::{DocumentStore, SessionStore};

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<ConversationSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .get(&session_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn save(&self, session: &ConversationSession) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ConversationSession>> {
        let sessions = self.sessions.lock().unwrap();
        let mut active: Vec<_> = sessions
            .values()
            .filter(|s| {
                s.user_id == user_id && s.status == crate::models::session::SessionStatus::Active
            })
            .cloned()
            .collect();
        active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(active)
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<Uuid, StoredDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, document: NewDocument) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let stored = StoredDocument {
            id,
            user_id: document.user_id,
            doc_type: document.doc_type.as_str().to_string(),
            title: document.title,
            content: serde_json::to_value(&document.content)?,
            created_at: chrono::Utc::now(),
        };
        self.documents.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn fetch(&self, user_id: Uuid, document_id: Uuid) -> Result<Option<StoredDocument>> {
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .get(&document_id)
            .filter(|d| d.user_id == user_id)
            .cloned())
    }
}
