//! Persistence contracts for the chat core.
//!
//! The orchestrator only ever sees these traits; Postgres backs them in
//! production and the in-memory doubles back them in tests. Sessions are the
//! durable source of truth — the context cache is rebuilt from
//! `ConversationSession.history`, never the other way around.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::document::{NewDocument, StoredDocument};
use crate::models::session::ConversationSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads one session scoped to its owning user. `None` means unknown.
    async fn load(&self, user_id: Uuid, session_id: Uuid)
        -> Result<Option<ConversationSession>>;

    /// Persists the full session state (upsert). Called once per turn, after
    /// the turn has fully succeeded.
    async fn save(&self, session: &ConversationSession) -> Result<()>;

    /// Active sessions for a user, most recently updated first.
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ConversationSession>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists a finalized document and returns its id.
    async fn create(&self, document: NewDocument) -> Result<Uuid>;

    /// Fetches a document scoped to its owning user.
    async fn fetch(&self, user_id: Uuid, document_id: Uuid) -> Result<Option<StoredDocument>>;
}
