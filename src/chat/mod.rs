//! Chat completion client used to answer questions over retrieved context.
//!
//! Requests are single-turn: the assembled prompt is sent as one `user` message with a fixed
//! temperature. No conversation history and no system message.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::openai::{OpenAiTransport, provider_message};

/// Errors surfaced by the chat completion provider.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with an error status.
    #[error("Chat provider returned {status}: {message}")]
    Api {
        /// Status returned by the provider.
        status: StatusCode,
        /// Provider's error message.
        message: String,
    },
    /// Provider response could not be interpreted.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by chat completion providers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a single-turn prompt and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String, ChatClientError>;
}

/// Client for the OpenAI `/chat/completions` endpoint.
pub struct OpenAiChatClient {
    transport: OpenAiTransport,
    model: String,
    temperature: f64,
}

impl OpenAiChatClient {
    /// Build a client for `model` sampling at `temperature`.
    pub fn new(http: Client, base_url: &str, api_key: &str, model: &str, temperature: f64) -> Self {
        Self {
            transport: OpenAiTransport::new(http, base_url, api_key),
            model: model.to_string(),
            temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ChatClientError> {
        let response = self
            .transport
            .post("chat/completions")
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": self.temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ChatClientError::Api {
                status,
                message: provider_message(status, &body),
            };
            tracing::error!(model = %self.model, error = %error, "Chat completion failed");
            return Err(error);
        }

        let payload: CompletionResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatClientError::InvalidResponse("response had no choices".into()))?;

        tracing::debug!(model = %self.model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}
