//! Core data types and error definitions for the upload and chat pipelines.

use crate::{
    chat::ChatClientError, config::ConfigError, document::Document,
    embedding::EmbeddingClientError, pdf::FetchError, pdf::PdfError, pinecone::PineconeError,
};
use thiserror::Error;

/// Errors produced while configuring the text splitter.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A zero chunk size can never make progress.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for new text in every chunk.
    #[error("chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidOverlap {
        /// Requested chunk size.
        chunk_size: usize,
        /// Requested overlap.
        chunk_overlap: usize,
    },
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request fields, non-PDF URL.
    InvalidInput,
    /// Missing credential or index name.
    Configuration,
    /// Chat requested before any upload.
    NotReady,
    /// Network failure talking to a remote host.
    Transport,
    /// A provider or library reported a failure.
    Upstream,
}

impl ErrorKind {
    /// Whether the caller caused the failure.
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::InvalidInput | Self::NotReady)
    }
}

/// Errors emitted by the processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Request failed validation.
    #[error("{0}")]
    InvalidInput(String),
    /// Required configuration is absent.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// No vector store exists yet.
    #[error("No documents available. Upload a PDF before chatting.")]
    NotReady,
    /// Downloading the PDF failed.
    #[error("Failed to fetch PDF: {0}")]
    Fetch(#[from] FetchError),
    /// Editing or extracting the PDF failed.
    #[error("Failed to process PDF: {0}")]
    Pdf(#[from] PdfError),
    /// Embedding provider failed.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Pinecone rejected or failed a request.
    #[error("Vector store request failed: {0}")]
    VectorStore(#[from] PineconeError),
    /// Chat completion provider failed.
    #[error("Chat completion failed: {0}")]
    Chat(#[from] ChatClientError),
}

impl ProcessingError {
    /// Classify the error for status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotReady => ErrorKind::NotReady,
            Self::Fetch(FetchError::NotPdf(_)) => ErrorKind::InvalidInput,
            Self::Fetch(_) => ErrorKind::Transport,
            Self::Pdf(_) => ErrorKind::Upstream,
            Self::Embedding(EmbeddingClientError::Http(_))
            | Self::VectorStore(PineconeError::Http(_))
            | Self::Chat(ChatClientError::Http(_)) => ErrorKind::Transport,
            Self::Embedding(_) | Self::VectorStore(_) | Self::Chat(_) => ErrorKind::Upstream,
        }
    }
}

/// Parameters of an upload request after HTTP-level defaults are applied.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// URL of the PDF; must end with `pdf`.
    pub paper_url: String,
    /// Name stored as `documentName` on every chunk.
    pub name: String,
    /// 1-based pages to remove before extraction.
    pub pages_to_delete: Vec<u32>,
}

/// Result of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Number of chunks embedded and stored.
    pub document_count: usize,
    /// Name the chunks were tagged with.
    pub name: String,
}

/// Parameters of a chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// Number of chunks to retrieve (defaults to 4).
    pub k: Option<usize>,
}

/// Answer produced by the chat pipeline.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Model answer.
    pub response: String,
    /// Chunks supplied as context, in similarity order.
    pub relevant_documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn client_caused_errors_are_classified_as_such() {
        assert!(
            ProcessingError::InvalidInput("missing".into())
                .kind()
                .is_client_error()
        );
        assert!(ProcessingError::NotReady.kind().is_client_error());
        assert_eq!(
            ProcessingError::from(FetchError::NotPdf("x.html".into())).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn server_side_errors_are_not_client_errors() {
        let config = ProcessingError::from(ConfigError::MissingVariable("OPENAI_API_KEY".into()));
        assert_eq!(config.kind(), ErrorKind::Configuration);
        assert!(!config.kind().is_client_error());

        let upstream = ProcessingError::from(ChatClientError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: "Incorrect API key provided".into(),
        });
        assert_eq!(upstream.kind(), ErrorKind::Upstream);
        assert!(upstream.to_string().contains("Incorrect API key provided"));

        let pdf = ProcessingError::from(PdfError::Parse("bad header".into()));
        assert_eq!(pdf.kind(), ErrorKind::Upstream);
    }
}
