pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversational document-builder API
        .route("/api/v1/chat/start", post(handlers::handle_start_chat))
        .route("/api/v1/chat/message", post(handlers::handle_send_message))
        .route(
            "/api/v1/chat/sessions",
            get(handlers::handle_list_sessions),
        )
        .route(
            "/api/v1/chat/sessions/:session_id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/chat/sessions/:session_id/finalize",
            post(handlers::handle_finalize),
        )
        .with_state(state)
}
