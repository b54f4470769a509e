//! Scripted `ModelService` double shared by the cache and orchestrator tests.
//! Replies are consumed in order; every reconstruction and prompt is recorded
//! so tests can assert on replay bounds and question targeting.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm_client::{LlmError, ModelConversation, ModelService};
use crate::models::session::ChatTurn;

pub enum ScriptedReply {
    Text(String),
    Unavailable,
}

#[derive(Default)]
struct ScriptState {
    replies: Mutex<VecDeque<ScriptedReply>>,
    replayed_turn_counts: Mutex<Vec<usize>>,
    prompts: Mutex<Vec<String>>,
}

#[derive(Default)]
pub struct ScriptedModel {
    state: Arc<ScriptState>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        let model = Arc::new(Self::default());
        for reply in replies {
            model.push_text(reply);
        }
        model
    }

    pub fn push_text(&self, reply: &str) {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Text(reply.to_string()));
    }

    /// Makes the next `send` fail like a model outage.
    pub fn push_unavailable(&self) {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Unavailable);
    }

    /// How many prior turns each `start_conversation` call replayed.
    pub fn replayed_turn_counts(&self) -> Vec<usize> {
        self.state.replayed_turn_counts.lock().unwrap().clone()
    }

    /// Every prompt sent through any conversation handle, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn start_conversation(
        &self,
        prior_turns: &[ChatTurn],
    ) -> Result<Box<dyn ModelConversation>, LlmError> {
        self.state
            .replayed_turn_counts
            .lock()
            .unwrap()
            .push(prior_turns.len());
        Ok(Box::new(ScriptedConversation {
            state: self.state.clone(),
        }))
    }
}

struct ScriptedConversation {
    state: Arc<ScriptState>,
}

#[async_trait]
impl ModelConversation for ScriptedConversation {
    async fn send(&mut self, prompt: &str) -> Result<String, LlmError> {
        self.state.prompts.lock().unwrap().push(prompt.to_string());
        match self.state.replies.lock().unwrap().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable) => Err(LlmError::Api {
                status: 503,
                message: "scripted outage".to_string(),
            }),
            None => panic!("scripted model ran out of replies for prompt: {prompt}"),
        }
    }
}
