//! Vector store handle: an embedding client bound to one Pinecone index.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    document::Document,
    embedding::EmbeddingClient,
    pinecone::{PineconeService, QueryMatch, Vector, flatten_metadata, nest_metadata},
    processing::types::ProcessingError,
};

/// Metadata key holding the chunk text inside each index record.
pub const TEXT_KEY: &str = "text";

/// Embeds documents into, and retrieves them from, a single Pinecone index.
pub struct VectorStore {
    embeddings: Arc<dyn EmbeddingClient>,
    index: PineconeService,
}

impl VectorStore {
    /// Bind an embedding client to an index.
    pub fn new(embeddings: Arc<dyn EmbeddingClient>, index: PineconeService) -> Self {
        Self { embeddings, index }
    }

    /// Data-plane host the store writes to.
    pub fn host(&self) -> &str {
        self.index.host()
    }

    /// Embed and upsert `documents`, returning how many were stored.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, ProcessingError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|document| document.page_content.clone())
            .collect();
        let embeddings = self.embeddings.embed_documents(texts).await?;
        debug_assert_eq!(documents.len(), embeddings.len());

        let count = documents.len();
        let vectors: Vec<Vector> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, values)| {
                let mut metadata = flatten_metadata(&document.metadata);
                metadata.insert(TEXT_KEY.into(), Value::String(document.page_content));
                Vector {
                    id: Uuid::new_v4().to_string(),
                    values,
                    metadata,
                }
            })
            .collect();

        let upserted = self.index.upsert(vectors).await?;
        tracing::debug!(documents = count, upserted, "Documents added to vector store");
        Ok(count)
    }

    /// Return the `k` documents most similar to `query`, best match first.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>, ProcessingError> {
        let vector = self.embeddings.embed_query(query).await?;
        let matches = self.index.query(vector, k).await?;
        tracing::debug!(k, hits = matches.len(), "Similarity search completed");
        Ok(matches.into_iter().map(into_document).collect())
    }
}

fn into_document(hit: QueryMatch) -> Document {
    let mut metadata = hit.metadata.unwrap_or_default();
    let page_content = match metadata.remove(TEXT_KEY) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };
    Document {
        page_content,
        metadata: nest_metadata(metadata),
    }
}
