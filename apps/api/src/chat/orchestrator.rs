//! Conversation Orchestrator — sequences one inbound turn end to end:
//! extract, normalize, merge, track progress, pick the next question, update
//! history, persist.
//!
//! Two rules shape everything here:
//! - Turns for one session are serialized through a per-session lock, never a
//!   global one.
//! - Nothing is persisted until the model calls for the turn have succeeded.
//!   A failed or timed-out call leaves the stored session exactly as it was,
//!   and the cached context handle is dropped so the next attempt rebuilds
//!   from persisted history.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::context_cache::{ContextCache, SharedConversation};
use crate::chat::merge::merge;
use crate::chat::normalize::normalize;
use crate::chat::progress::{collected_sections, is_complete, missing_sections, progress, Section};
use crate::chat::prompts::{
    extraction_prompt, next_question_prompt, rephrase_request, OPENING_QUESTION,
};
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, ModelService};
use crate::models::document::{CanonicalDocument, DocType, NewDocument};
use crate::models::session::{ChatTurn, ConversationSession, SessionStatus};
use crate::store::{DocumentStore, SessionStore};

#[derive(Debug, Deserialize)]
pub struct StartChat {
    pub initial_message: String,
    pub doc_type: DocType,
    pub existing_document_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub message: String,
    pub document: CanonicalDocument,
    pub progress: u8,
    pub is_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct TurnReply {
    pub session_id: Uuid,
    pub message: String,
    pub document: CanonicalDocument,
    pub progress: u8,
    pub is_complete: bool,
    pub collected_sections: Vec<Section>,
    pub missing_sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeReply {
    pub document_id: Uuid,
    pub document: CanonicalDocument,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub doc_type: DocType,
    pub status: SessionStatus,
    pub history: Vec<ChatTurn>,
    pub document: CanonicalDocument,
    pub progress: u8,
    pub collected_sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub doc_type: DocType,
    pub status: SessionStatus,
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}

pub struct ChatOrchestrator {
    model: Arc<dyn ModelService>,
    sessions: Arc<dyn SessionStore>,
    documents: Arc<dyn DocumentStore>,
    contexts: Arc<ContextCache>,
    /// One lock per session id so overlapping turns for the same session
    /// serialize without stalling unrelated sessions.
    turn_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatOrchestrator {
    pub fn new(
        model: Arc<dyn ModelService>,
        sessions: Arc<dyn SessionStore>,
        documents: Arc<dyn DocumentStore>,
        contexts: Arc<ContextCache>,
    ) -> Self {
        Self {
            model,
            sessions,
            documents,
            contexts,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a new session. With an existing document the opening turn skips
    /// extraction entirely and goes straight to question generation;
    /// otherwise the initial message is extracted into an empty template.
    pub async fn start(&self, user_id: Uuid, request: StartChat) -> Result<ChatReply, AppError> {
        let initial_message = request.initial_message.trim().to_string();
        if initial_message.is_empty() {
            return Err(AppError::Validation("initial_message must not be empty".into()));
        }

        let mut session = ConversationSession::new(user_id, request.doc_type);

        let ran_extraction = match request.existing_document_id {
            Some(document_id) => {
                let stored = self
                    .documents
                    .fetch(user_id, document_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;
                session.current_document = serde_json::from_value(stored.content)
                    .map_err(|e| AppError::Internal(e.into()))?;
                false
            }
            None => {
                let handle = self.context_handle(&session).await?;
                let prompt =
                    extraction_prompt(&session.current_document, OPENING_QUESTION, &initial_message);
                let reply = self.send_through(&session, &handle, &prompt).await?;

                if let Some(extracted) = parse_extraction(&reply) {
                    session.current_document = merge(&session.current_document, &extracted);
                } else {
                    debug!("Opening extraction produced no structured data");
                }
                true
            }
        };

        let handle = self.context_handle(&session).await?;
        let question_prompt = next_question_prompt(&session.current_document, session.doc_type);
        let first_question = self.send_through(&session, &handle, &question_prompt).await?;

        if ran_extraction {
            session.history.push(ChatTurn::user(initial_message));
        }
        session.history.push(ChatTurn::assistant(&first_question));
        session.collected_sections = collected_sections(&session.current_document);
        session.updated_at = Utc::now();
        self.sessions.save(&session).await?;

        info!(
            "Started session {} for user {user_id} at {}% progress",
            session.session_id,
            progress(&session.current_document)
        );

        Ok(ChatReply {
            session_id: session.session_id,
            message: first_question,
            progress: progress(&session.current_document),
            is_complete: is_complete(&session.current_document),
            document: session.current_document,
        })
    }

    /// Processes one user turn of an active session.
    ///
    /// A turn that yields no new information (unparseable model output, or a
    /// merge that changes nothing) does not advance topics: the reply is a
    /// locally-built rephrase request and the document stays as it was.
    pub async fn continue_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        message: &str,
    ) -> Result<TurnReply, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("message must not be empty".into()));
        }

        let _guard = self.turn_guard(session_id).await;

        let mut session = self
            .sessions
            .load(user_id, session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(format!("Unknown session {session_id}")))?;
        if session.status != SessionStatus::Active {
            return Err(AppError::SessionNotFound(format!(
                "Session {session_id} is {}",
                session.status.as_str()
            )));
        }

        let last_question = session
            .last_question()
            .unwrap_or(OPENING_QUESTION)
            .to_string();

        let handle = self.context_handle(&session).await?;
        let prompt = extraction_prompt(&session.current_document, &last_question, message);
        let reply = self.send_through(&session, &handle, &prompt).await?;

        let merged = parse_extraction(&reply)
            .map(|extracted| merge(&session.current_document, &extracted));

        let next_message = match merged {
            Some(updated) if updated != session.current_document => {
                session.current_document = updated;
                let question_prompt =
                    next_question_prompt(&session.current_document, session.doc_type);
                self.send_through(&session, &handle, &question_prompt).await?
            }
            // Extraction failed or added nothing: ask again, don't advance.
            _ => {
                debug!("Turn for session {session_id} made no progress; asking to rephrase");
                rephrase_request(&last_question)
            }
        };

        session.history.push(ChatTurn::user(message));
        session.history.push(ChatTurn::assistant(&next_message));
        session.collected_sections = collected_sections(&session.current_document);
        session.updated_at = Utc::now();
        self.sessions.save(&session).await?;

        Ok(TurnReply {
            session_id,
            message: next_message,
            progress: progress(&session.current_document),
            is_complete: is_complete(&session.current_document),
            collected_sections: session.collected_sections.clone(),
            missing_sections: missing_sections(&session.current_document),
            document: session.current_document,
        })
    }

    /// Copies the session's document into a persisted record, bypassing any
    /// further extraction, and marks the session completed. Each call creates
    /// a new document; completed sessions reject further turns.
    pub async fn finalize(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        title: &str,
    ) -> Result<FinalizeReply, AppError> {
        let _guard = self.turn_guard(session_id).await;

        let mut session = self
            .sessions
            .load(user_id, session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(format!("Unknown session {session_id}")))?;

        let title = if title.trim().is_empty() {
            format!("My {}", session.doc_type)
        } else {
            title.trim().to_string()
        };

        let document_id = self
            .documents
            .create(NewDocument {
                user_id,
                doc_type: session.doc_type,
                title,
                content: session.current_document.clone(),
            })
            .await?;

        session.status = SessionStatus::Completed;
        session.updated_at = Utc::now();
        self.sessions.save(&session).await?;
        self.contexts.invalidate(user_id, session_id);

        info!("Finalized session {session_id} into document {document_id}");

        Ok(FinalizeReply {
            document_id,
            document: session.current_document,
        })
    }

    pub async fn get_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<SessionView, AppError> {
        let session = self
            .sessions
            .load(user_id, session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(format!("Unknown session {session_id}")))?;

        Ok(SessionView {
            session_id: session.session_id,
            doc_type: session.doc_type,
            status: session.status,
            history: session.history,
            progress: progress(&session.current_document),
            collected_sections: session.collected_sections,
            created_at: session.created_at,
            updated_at: session.updated_at,
            document: session.current_document,
        })
    }

    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = self.sessions.list_active(user_id).await?;
        Ok(sessions
            .into_iter()
            .map(|s| SessionSummary {
                session_id: s.session_id,
                doc_type: s.doc_type,
                status: s.status,
                progress: progress(&s.current_document),
                updated_at: s.updated_at,
            })
            .collect())
    }

    async fn turn_guard(&self, session_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.turn_locks.lock().unwrap();
            // A guard in flight keeps a clone of its Arc, so entries at
            // strong count 1 belong to idle sessions and can go. Keeps the
            // map proportional to in-flight turns, not sessions ever seen.
            locks.retain(|id, lock| *id == session_id || Arc::strong_count(lock) > 1);
            locks
                .entry(session_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn turn_lock_count(&self) -> usize {
        self.turn_locks.lock().unwrap().len()
    }

    async fn context_handle(
        &self,
        session: &ConversationSession,
    ) -> Result<SharedConversation, AppError> {
        Ok(self
            .contexts
            .get_or_create(
                &*self.model,
                session.user_id,
                session.session_id,
                &session.history,
            )
            .await?)
    }

    /// Sends a prompt through the session's context handle. On failure the
    /// cached handle is dropped: it may have absorbed turns this aborted turn
    /// will never persist, and reconstruction from history is the safe path.
    async fn send_through(
        &self,
        session: &ConversationSession,
        handle: &SharedConversation,
        prompt: &str,
    ) -> Result<String, AppError> {
        let mut conversation = handle.lock().await;
        match conversation.send(prompt).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.contexts
                    .invalidate(session.user_id, session.session_id);
                Err(AppError::ModelUnavailable(e))
            }
        }
    }
}

/// Turns raw model output into a normalized partial document. `None` covers
/// both malformed JSON and non-object payloads; the caller treats it as
/// "nothing extracted", never as an error.
fn parse_extraction(reply: &str) -> Option<CanonicalDocument> {
    let text = strip_json_fences(reply);
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    normalize(&value)
}
