/// LLM Client — the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All model interactions go through `ModelService` / `ModelConversation`,
/// which this module implements over the Messages API.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::session::{ChatTurn, TurnRole};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
/// Every request gets a hard timeout so a stuck call can never pin a
/// per-session lock indefinitely.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The language-model boundary the orchestrator depends on.
///
/// Carried in `AppState` as `Arc<dyn ModelService>` so tests swap in a
/// scripted mock; `LlmClient` is the production implementation.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Opens a stateful conversation seeded with prior turns. Seeding is a
    /// deterministic local operation — no API call happens until `send` —
    /// which is what makes reconstruction after eviction safe to retry.
    async fn start_conversation(
        &self,
        prior_turns: &[ChatTurn],
    ) -> Result<Box<dyn ModelConversation>, LlmError>;
}

/// A live conversational handle. `send` appends the user message, calls the
/// model with the accumulated context, appends the reply, and returns it.
#[async_trait]
pub trait ModelConversation: Send {
    async fn send(&mut self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ApiMessage],
}

#[derive(Debug, Deserialize)]
struct LlmResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl LlmResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Production `ModelService` over the Anthropic Messages API, with retry
/// logic for rate limits and transient server errors.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call with the full message list, returning the reply text.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn call(&self, messages: &[ApiMessage]) -> Result<String, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return match llm_response.text() {
                Some(text) => Ok(text.to_string()),
                None => Err(LlmError::EmptyContent),
            };
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ModelService for LlmClient {
    async fn start_conversation(
        &self,
        prior_turns: &[ChatTurn],
    ) -> Result<Box<dyn ModelConversation>, LlmError> {
        let messages = prior_turns
            .iter()
            .map(|turn| ApiMessage {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "assistant",
                },
                content: turn.text.clone(),
            })
            .collect();

        Ok(Box::new(Conversation {
            client: self.clone(),
            messages,
        }))
    }
}

/// Accumulating message list over the stateless Messages API. Dropping the
/// handle loses nothing the session history cannot rebuild.
struct Conversation {
    client: LlmClient,
    messages: Vec<ApiMessage>,
}

#[async_trait]
impl ModelConversation for Conversation {
    async fn send(&mut self, prompt: &str) -> Result<String, LlmError> {
        self.messages.push(ApiMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let reply = self.client.call(&self.messages).await?;

        self.messages.push(ApiMessage {
            role: "assistant",
            content: reply.clone(),
        });

        Ok(reply)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output before
/// structural parsing. The model is told not to emit them; it sometimes does.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn start_conversation_is_local_and_infallible() {
        let client = LlmClient::new("test-key".into());
        let history = vec![
            ChatTurn::assistant("What is your name?"),
            ChatTurn::user("Jane Doe"),
        ];

        // Seeding must succeed with no server reachable; only send() talks HTTP.
        assert!(client.start_conversation(&history).await.is_ok());
    }
}
