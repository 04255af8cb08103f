//! Embedding client abstraction and the OpenAI adapter.
//!
//! Inputs are sent in batches; up to [`EmbeddingPolicy::max_concurrency`] batches are in flight
//! at once and results keep input order. Transport errors, rate limits, and server errors are
//! retried a fixed number of times with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::openai::{OpenAiTransport, is_retryable_status, provider_message};

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with an error status.
    #[error("Embedding provider returned {status}: {message}")]
    Api {
        /// Status returned by the provider.
        status: StatusCode,
        /// Provider's error message.
        message: String,
    },
    /// Provider response did not match the request.
    #[error("Malformed embedding response: {0}")]
    InvalidResponse(String),
}

impl EmbeddingClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => is_retryable_status(*status),
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce one vector per input text, in input order.
    async fn embed_documents(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;

    /// Produce the vector for a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        self.embed_documents(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| {
                EmbeddingClientError::InvalidResponse("no vector returned for query".into())
            })
    }
}

/// Batching, concurrency, and retry limits for embedding calls.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingPolicy {
    /// Inputs per request.
    pub batch_size: usize,
    /// Requests in flight at once.
    pub max_concurrency: usize,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for EmbeddingPolicy {
    fn default() -> Self {
        Self {
            batch_size: 512,
            max_concurrency: 5,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Client for the OpenAI `/embeddings` endpoint.
pub struct OpenAiEmbeddingClient {
    transport: OpenAiTransport,
    model: String,
    policy: EmbeddingPolicy,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbeddingClient {
    /// Build a client for `model` using the default policy.
    pub fn new(http: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            transport: OpenAiTransport::new(http, base_url, api_key),
            model: model.to_string(),
            policy: EmbeddingPolicy::default(),
        }
    }

    /// Override batching and retry limits.
    pub fn with_policy(mut self, policy: EmbeddingPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn embed_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let mut attempt = 0;
        loop {
            match self.request_batch(&batch).await {
                Ok(vectors) => return Ok(vectors),
                Err(error) if attempt < self.policy.max_retries && error.is_retryable() => {
                    let delay = self.policy.base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Embedding request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn request_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let response = self
            .transport
            .post("embeddings")
            .json(&json!({
                "model": self.model,
                "input": batch,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::Api {
                status,
                message: provider_message(status, &body),
            });
        }

        let EmbeddingResponse { mut data } = response.json().await?;
        if data.len() != batch.len() {
            return Err(EmbeddingClientError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                batch.len(),
                data.len()
            )));
        }
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed_documents(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let total = texts.len();
        // Newlines degrade embedding quality for this model family.
        let batches: Vec<Vec<String>> = texts
            .chunks(self.policy.batch_size.max(1))
            .map(|chunk| chunk.iter().map(|text| text.replace('\n', " ")).collect())
            .collect();

        tracing::debug!(
            model = %self.model,
            inputs = total,
            batches = batches.len(),
            "Generating embeddings"
        );

        let per_batch: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| self.embed_batch(batch))
            .buffered(self.policy.max_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(per_batch.into_iter().flatten().collect())
    }
}
