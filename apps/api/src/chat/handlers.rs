use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::orchestrator::{
    ChatReply, FinalizeReply, SessionSummary, SessionView, StartChat, TurnReply,
};
use crate::errors::AppError;
use crate::models::document::DocType;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct StartChatRequest {
    pub user_id: Uuid,
    pub initial_message: String,
    pub doc_type: DocType,
    pub existing_document_id: Option<Uuid>,
}

/// POST /api/v1/chat/start
pub async fn handle_start_chat(
    State(state): State<AppState>,
    Json(req): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<ChatReply>), AppError> {
    let reply = state
        .orchestrator
        .start(
            req.user_id,
            StartChat {
                initial_message: req.initial_message,
                doc_type: req.doc_type,
                existing_document_id: req.existing_document_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub message: String,
}

/// POST /api/v1/chat/message
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnReply>, AppError> {
    let reply = state
        .orchestrator
        .continue_session(req.user_id, req.session_id, &req.message)
        .await?;
    Ok(Json(reply))
}

#[derive(Deserialize)]
pub struct FinalizeRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub title: String,
}

/// POST /api/v1/chat/sessions/:session_id/finalize
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FinalizeReply>, AppError> {
    let reply = state
        .orchestrator
        .finalize(req.user_id, session_id, &req.title)
        .await?;
    Ok(Json(reply))
}

/// GET /api/v1/chat/sessions/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .orchestrator
        .get_session(params.user_id, session_id)
        .await?;
    Ok(Json(view))
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// GET /api/v1/chat/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.orchestrator.list_sessions(params.user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}
