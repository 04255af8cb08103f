//! Download of remote PDF documents.

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors raised while downloading a PDF.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL does not end with `pdf`; nothing was requested.
    #[error("URL must point to a PDF file (ending in \"pdf\"): {0}")]
    NotPdf(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Remote host answered with a non-success status.
    #[error("Unexpected response ({status}) fetching {url}")]
    UnexpectedStatus {
        /// Status returned by the remote host.
        status: StatusCode,
        /// URL that was requested.
        url: String,
    },
}

/// Reject URLs that do not end with the literal, case-sensitive suffix `pdf`.
pub fn ensure_pdf_url(url: &str) -> Result<(), FetchError> {
    if url.ends_with("pdf") {
        Ok(())
    } else {
        Err(FetchError::NotPdf(url.to_string()))
    }
}

/// Binary-safe downloader for PDF URLs.
#[derive(Clone)]
pub struct PdfFetcher {
    client: Client,
}

impl PdfFetcher {
    /// Wrap a shared HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download the full response body of `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        ensure_pdf_url(url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error = FetchError::UnexpectedStatus {
                status,
                url: url.to_string(),
            };
            tracing::error!(error = %error, "PDF download failed");
            return Err(error);
        }

        let bytes = response.bytes().await?;
        tracing::debug!(url, bytes = bytes.len(), "PDF downloaded");
        Ok(bytes.to_vec())
    }
}
