use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::document::{NewDocument, StoredDocument};
use crate::models::session::ConversationSession;
use crate::store::{DocumentStore, SessionStore};

/// Sessions persist as one JSONB blob per row plus the columns queries
/// filter and sort on. The blob is the authoritative serialization of
/// `ConversationSession`.
#[derive(Debug, FromRow)]
struct SessionRow {
    data: Value,
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<ConversationSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT data FROM chat_sessions WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            serde_json::from_value(r.data).context("stored session failed to deserialize")
        })
        .transpose()
    }

    async fn save(&self, session: &ConversationSession) -> Result<()> {
        let data = serde_json::to_value(session)?;

        sqlx::query(
            r#"
            INSERT INTO chat_sessions (session_id, user_id, status, updated_at, data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id)
            DO UPDATE SET status = $3, updated_at = $4, data = $5
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(session.status.as_str())
        .bind(session.updated_at)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ConversationSession>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT data FROM chat_sessions \
             WHERE user_id = $1 AND status = 'active' \
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                serde_json::from_value(r.data).context("stored session failed to deserialize")
            })
            .collect()
    }
}

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, document: NewDocument) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let content = serde_json::to_value(&document.content)?;
        let created_at: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, doc_type, title, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(document.user_id)
        .bind(document.doc_type.as_str())
        .bind(&document.title)
        .bind(&content)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        info!(
            "Created document {id} ({}) for user {}",
            document.doc_type, document.user_id
        );
        Ok(id)
    }

    async fn fetch(&self, user_id: Uuid, document_id: Uuid) -> Result<Option<StoredDocument>> {
        let row: Option<StoredDocument> =
            sqlx::query_as("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
                .bind(document_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row)
    }
}
