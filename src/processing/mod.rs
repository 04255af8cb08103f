//! Upload and chat pipelines: chunking, vector storage, prompting, and orchestration.

pub mod chunking;
pub mod prompt;
mod service;
pub mod store;
pub mod types;

pub use service::{DEFAULT_DOCUMENT_NAME, DEFAULT_K, RagApi, RagService};
pub use store::VectorStore;
pub use types::{
    ChatOutcome, ChatRequest, ChunkingError, ErrorKind, ProcessingError, UploadOutcome,
    UploadRequest,
};
