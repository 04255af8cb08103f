//! HTTP client wrapper for a single Pinecone index.

use reqwest::{Client, Method, StatusCode, Url};
use serde_json::{Value, json};

use crate::pinecone::types::{
    DescribeIndexResponse, PineconeError, QueryMatch, QueryResponse, UpsertResponse, Vector,
};

const API_VERSION: &str = "2024-07";
/// Pinecone's documented per-request upsert recommendation.
const UPSERT_BATCH_SIZE: usize = 100;

/// Lightweight HTTP client for one Pinecone index's data plane.
pub struct PineconeService {
    pub(crate) client: Client,
    pub(crate) host: String,
    pub(crate) api_key: String,
    pub(crate) namespace: Option<String>,
}

impl PineconeService {
    /// Bind to an index whose data-plane host is already known.
    pub fn new(
        client: Client,
        host: &str,
        api_key: &str,
        namespace: Option<String>,
    ) -> Result<Self, PineconeError> {
        let host = normalize_host(host).map_err(PineconeError::InvalidUrl)?;
        tracing::debug!(host = %host, namespace = ?namespace, "Initialized Pinecone HTTP client");
        Ok(Self {
            client,
            host,
            api_key: api_key.to_string(),
            namespace,
        })
    }

    /// Resolve the data-plane host of `index_name` through the control plane, then bind to it.
    pub async fn connect(
        client: Client,
        controller_url: &str,
        api_key: &str,
        index_name: &str,
        namespace: Option<String>,
    ) -> Result<Self, PineconeError> {
        let url = format_endpoint(controller_url, &format!("indexes/{index_name}"));
        let response = client
            .get(url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = PineconeError::UnexpectedStatus { status, body };
            tracing::error!(
                index = index_name,
                error = %error,
                "Failed to describe Pinecone index"
            );
            return Err(error);
        }

        let DescribeIndexResponse { host } = response.json().await?;
        tracing::debug!(index = index_name, host = %host, "Resolved Pinecone index host");
        Self::new(client, &host, api_key, namespace)
    }

    /// Data-plane base URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Upsert vectors in batches, returning the number Pinecone reports as written.
    pub async fn upsert(&self, vectors: Vec<Vector>) -> Result<usize, PineconeError> {
        let mut upserted = 0;
        for batch in vectors.chunks(UPSERT_BATCH_SIZE) {
            let mut body = json!({ "vectors": batch });
            if let Some(namespace) = &self.namespace
                && let Some(object) = body.as_object_mut()
            {
                object.insert("namespace".into(), Value::String(namespace.clone()));
            }

            let response = self
                .request(Method::POST, "vectors/upsert")
                .json(&body)
                .send()
                .await?;
            let response = self.ensure_success(response, "upsert").await?;
            let UpsertResponse { upserted_count } = response.json().await?;
            tracing::debug!(vectors = batch.len(), upserted_count, "Vectors upserted");
            upserted += upserted_count;
        }
        Ok(upserted)
    }

    /// Return the `top_k` nearest records to `vector`, including metadata.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, PineconeError> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let Some(namespace) = &self.namespace
            && let Some(object) = body.as_object_mut()
        {
            object.insert("namespace".into(), Value::String(namespace.clone()));
        }

        let response = self
            .request(Method::POST, "query")
            .json(&body)
            .send()
            .await?;
        let response = self.ensure_success(response, "query").await?;
        let QueryResponse { matches } = response.json().await?;
        Ok(matches)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.host, path);
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn ensure_success(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, PineconeError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = PineconeError::UnexpectedStatus { status, body };
        if status == StatusCode::NOT_FOUND {
            tracing::error!(
                operation,
                host = %self.host,
                error = %error,
                "Pinecone index not found"
            );
        } else {
            tracing::error!(operation, error = %error, "Pinecone request failed");
        }
        Err(error)
    }
}

/// Accept bare hosts as returned by the control plane (`name-abc.svc.pinecone.io`).
fn normalize_host(host: &str) -> Result<String, String> {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return Err("host is empty".into());
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&candidate).map_err(|err| err.to_string())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
