//! Shared helpers for OpenAI-compatible HTTP endpoints.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

/// Authenticated JSON transport for one OpenAI-compatible API.
#[derive(Clone)]
pub(crate) struct OpenAiTransport {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiTransport {
    pub(crate) fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http.post(url).bearer_auth(&self.api_key)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the provider's human-readable message from an error body.
pub(crate) fn provider_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Rate limits and server errors are worth another attempt.
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
