//! Shared types used by the Pinecone client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Pinecone.
#[derive(Debug, Error)]
pub enum PineconeError {
    /// Index host failed to parse or normalize.
    #[error("Invalid Pinecone host: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Pinecone responded with an unexpected status code.
    #[error("Unexpected Pinecone response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Pinecone.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Record written by an upsert.
#[derive(Debug, Clone, Serialize)]
pub struct Vector {
    /// Unique record identifier.
    pub id: String,
    /// Embedding values.
    pub values: Vec<f32>,
    /// Flat metadata (scalars and string lists only).
    pub metadata: Map<String, Value>,
}

/// Scored record returned by a query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    /// Record identifier.
    pub id: String,
    /// Similarity score.
    #[serde(default)]
    pub score: f32,
    /// Stored metadata, when requested.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct DescribeIndexResponse {
    pub(crate) host: String,
}

#[derive(Deserialize)]
pub(crate) struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    pub(crate) upserted_count: usize,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Vec<QueryMatch>,
}
