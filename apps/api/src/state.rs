use std::sync::Arc;

use sqlx::PgPool;

use crate::chat::orchestrator::ChatOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pool handle reserved for readiness checks; the stores hold their own clones.
    #[allow(dead_code)]
    pub db: PgPool,
    /// The conversational document-building core. Owns the model client,
    /// session/document stores, and the context cache.
    pub orchestrator: Arc<ChatOrchestrator>,
}
