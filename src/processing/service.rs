//! Application service coordinating the upload and chat pipelines.

use crate::{
    chat::{ChatClient, OpenAiChatClient},
    config::Config,
    document::{DOCUMENT_NAME_KEY, Document},
    embedding::OpenAiEmbeddingClient,
    metrics::{MetricsSnapshot, RagMetrics},
    pdf::{self, PdfError, PdfFetcher},
    pinecone::PineconeService,
    processing::{
        chunking::TextSplitter,
        prompt::{build_prompt, format_context},
        store::VectorStore,
        types::{ChatOutcome, ChatRequest, ProcessingError, UploadOutcome, UploadRequest},
    },
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Number of chunks retrieved for a chat request when `k` is omitted.
pub const DEFAULT_K: usize = 4;
/// Name stored on chunks when the caller supplies none.
pub const DEFAULT_DOCUMENT_NAME: &str = "unnamed";

/// Coordinates fetch, page removal, extraction, chunking, storage, retrieval, and chat.
///
/// The vector store handle is created by the first successful store and kept for the process
/// lifetime; the chat client is created on first use. Both sit behind `OnceCell`s so concurrent
/// first requests initialize them exactly once. Construct the service once near process start
/// and share it through an `Arc`.
pub struct RagService {
    config: Arc<Config>,
    http: Client,
    fetcher: PdfFetcher,
    splitter: TextSplitter,
    vector_store: OnceCell<VectorStore>,
    chat_client: OnceCell<Arc<dyn ChatClient>>,
    metrics: Arc<RagMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Fetch, prepare, chunk, and store a PDF.
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ProcessingError>;

    /// Answer a question from the stored chunks.
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl RagService {
    /// Build a service with a shared HTTP client; no remote calls are made here.
    pub fn new(config: Arc<Config>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("paperchat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        tracing::debug!(
            embedding_model = %config.embedding_model,
            chat_model = %config.chat_model,
            "Initialized processing service"
        );
        Ok(Self {
            fetcher: PdfFetcher::new(http.clone()),
            http,
            config,
            splitter: TextSplitter::default(),
            vector_store: OnceCell::new(),
            chat_client: OnceCell::new(),
            metrics: Arc::new(RagMetrics::new()),
        })
    }

    /// Use a pre-built vector store instead of creating one on the first store.
    pub fn with_vector_store(mut self, store: VectorStore) -> Self {
        self.vector_store = OnceCell::from(store);
        self
    }

    /// Use a pre-built chat client instead of the configured OpenAI client.
    pub fn with_chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = OnceCell::from(client);
        self
    }

    /// Whether a vector store handle exists.
    pub fn is_ready(&self) -> bool {
        self.vector_store.initialized()
    }

    /// Fetch the PDF, drop the requested pages, extract, chunk, and store it.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ProcessingError> {
        let UploadRequest {
            paper_url,
            name,
            pages_to_delete,
        } = request;
        let paper_url = paper_url.trim().to_string();
        if paper_url.is_empty() {
            return Err(ProcessingError::InvalidInput("paperUrl is required".into()));
        }
        pdf::ensure_pdf_url(&paper_url)?;
        self.require_store_config()?;

        tracing::info!(url = %paper_url, name = %name, "Processing PDF upload");
        let mut bytes = self.fetcher.fetch(&paper_url).await?;
        if !pages_to_delete.is_empty() {
            tracing::debug!(pages = ?pages_to_delete, "Removing pages before extraction");
            bytes = tokio::task::spawn_blocking(move || pdf::delete_pages(bytes, &pages_to_delete))
                .await
                .map_err(|error| PdfError::Worker(error.to_string()))??;
        }

        let documents: Vec<Document> = pdf::load_documents(bytes)
            .await?
            .into_iter()
            .map(|document| document.with_metadata("source", paper_url.as_str()))
            .collect();
        let chunks = self.splitter.split_documents(&documents);
        tracing::debug!(
            pages = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.splitter.chunk_size(),
            chunk_overlap = self.splitter.chunk_overlap(),
            "Split PDF into chunks"
        );

        let name = effective_name(&name).to_string();
        let document_count = self.store(chunks, &name).await?;
        self.metrics.record_upload(document_count as u64);
        tracing::info!(
            url = %paper_url,
            name = %name,
            document_count,
            "PDF upload completed"
        );

        Ok(UploadOutcome {
            document_count,
            name,
        })
    }

    /// Tag chunks with `name`, then embed and store them, creating the store on first use.
    pub async fn store(&self, chunks: Vec<Document>, name: &str) -> Result<usize, ProcessingError> {
        self.require_store_config()?;
        let name = effective_name(name);
        let chunks: Vec<Document> = chunks
            .into_iter()
            .map(|chunk| chunk.with_metadata(DOCUMENT_NAME_KEY, name))
            .collect();

        let store = self
            .vector_store
            .get_or_try_init(|| self.connect_store())
            .await?;
        store.add_documents(chunks).await
    }

    /// Return the `k` (default 4) chunks most similar to `query`.
    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> Result<Vec<Document>, ProcessingError> {
        let k = k.unwrap_or(DEFAULT_K);
        if k == 0 {
            return Err(ProcessingError::InvalidInput("k must be at least 1".into()));
        }
        let store = self.vector_store.get().ok_or(ProcessingError::NotReady)?;
        store.similarity_search(query, k).await
    }

    /// Retrieve context for the message and ask the chat model to answer from it.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ProcessingError> {
        let ChatRequest { message, k } = request;
        if message.trim().is_empty() {
            return Err(ProcessingError::InvalidInput("message is required".into()));
        }
        if !self.is_ready() {
            return Err(ProcessingError::NotReady);
        }
        let chat_client = self
            .chat_client
            .get_or_try_init(|| async { self.build_chat_client() })
            .await?;

        let relevant_documents = self.search(&message, k).await?;
        let prompt = build_prompt(&format_context(&relevant_documents), &message);
        tracing::debug!(
            documents = relevant_documents.len(),
            prompt_chars = prompt.len(),
            "Requesting chat completion"
        );
        let response = chat_client.complete(&prompt).await?;
        self.metrics.record_chat();
        tracing::info!(
            documents = relevant_documents.len(),
            "Chat response generated"
        );

        Ok(ChatOutcome {
            response,
            relevant_documents,
        })
    }

    /// Snapshot of upload and chat counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn require_store_config(&self) -> Result<(), ProcessingError> {
        self.config.require_openai_api_key()?;
        self.config.require_pinecone_api_key()?;
        self.config.require_pinecone_index_name()?;
        Ok(())
    }

    async fn connect_store(&self) -> Result<VectorStore, ProcessingError> {
        let config = &self.config;
        let openai_key = config.require_openai_api_key()?;
        let pinecone_key = config.require_pinecone_api_key()?;
        let index_name = config.require_pinecone_index_name()?;

        let embeddings = Arc::new(OpenAiEmbeddingClient::new(
            self.http.clone(),
            &config.openai_base_url,
            openai_key,
            &config.embedding_model,
        ));
        let index = match config.pinecone_index_host.as_deref() {
            Some(host) => PineconeService::new(
                self.http.clone(),
                host,
                pinecone_key,
                config.pinecone_namespace.clone(),
            )?,
            None => {
                PineconeService::connect(
                    self.http.clone(),
                    &config.pinecone_controller_url,
                    pinecone_key,
                    index_name,
                    config.pinecone_namespace.clone(),
                )
                .await?
            }
        };
        let store = VectorStore::new(embeddings, index);
        tracing::info!(index = index_name, host = %store.host(), "Vector store initialized");
        Ok(store)
    }

    fn build_chat_client(&self) -> Result<Arc<dyn ChatClient>, ProcessingError> {
        let api_key = self.config.require_openai_api_key()?;
        Ok(Arc::new(OpenAiChatClient::new(
            self.http.clone(),
            &self.config.openai_base_url,
            api_key,
            &self.config.chat_model,
            self.config.chat_temperature,
        )))
    }
}

fn effective_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_DOCUMENT_NAME
    } else {
        trimmed
    }
}

#[async_trait]
impl RagApi for RagService {
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ProcessingError> {
        RagService::upload(self, request).await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ProcessingError> {
        RagService::chat(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        RagService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chat::ChatClientError, config::ConfigError, processing::store::tests::StubEmbeddings,
    };
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;
    use std::{collections::HashMap, time::Duration};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingChat {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatClient for RecordingChat {
        async fn complete(&self, prompt: &str) -> Result<String, ChatClientError> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok("It is a transformer.".into())
        }
    }

    fn config(pairs: &[(&str, &str)]) -> Arc<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Arc::new(Config::from_lookup(|key| vars.get(key).cloned()).expect("config"))
    }

    fn full_config(server: &MockServer) -> Arc<Config> {
        let host = server.base_url();
        config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("PINECONE_INDEX_NAME", "papers"),
            ("PINECONE_INDEX_HOST", host.as_str()),
        ])
    }

    fn ready_service(server: &MockServer, chat: Arc<RecordingChat>) -> RagService {
        let index = PineconeService::new(Client::new(), &server.base_url(), "pc-test", None)
            .expect("index");
        RagService::new(full_config(server))
            .expect("service")
            .with_vector_store(VectorStore::new(Arc::new(StubEmbeddings::default()), index))
            .with_chat_client(chat)
    }

    #[tokio::test]
    async fn chat_before_any_upload_is_not_ready() {
        let service = RagService::new(config(&[])).expect("service");
        let error = service
            .chat(ChatRequest {
                message: "What is this paper about?".into(),
                k: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(error, ProcessingError::NotReady));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_first() {
        let service = RagService::new(config(&[])).expect("service");
        let error = service
            .chat(ChatRequest {
                message: "   ".into(),
                k: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(error, ProcessingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn non_pdf_url_fails_before_configuration_check() {
        let service = RagService::new(config(&[])).expect("service");
        let error = service
            .upload(UploadRequest {
                paper_url: "https://example.org/paper.html".into(),
                name: "doc".into(),
                pages_to_delete: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(error.kind().is_client_error());
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let server = MockServer::start_async().await;
        let pdf_host = server
            .mock_async(|when, then| {
                when.path("/paper.pdf");
                then.status(200).body("%PDF-1.5");
            })
            .await;

        let service =
            RagService::new(config(&[("OPENAI_API_KEY", "sk-test")])).expect("service");
        let error = service
            .upload(UploadRequest {
                paper_url: server.url("/paper.pdf"),
                name: "doc".into(),
                pages_to_delete: Vec::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ProcessingError::Configuration(ConfigError::MissingVariable(ref key))
                if key == "PINECONE_API_KEY"
        ));
        assert_eq!(pdf_host.hits_async().await, 0);
        assert!(!service.is_ready());
    }

    #[tokio::test]
    async fn chat_without_openai_key_is_a_configuration_error() {
        let server = MockServer::start_async().await;
        let index = PineconeService::new(Client::new(), &server.base_url(), "pc-test", None)
            .expect("index");
        let service = RagService::new(config(&[]))
            .expect("service")
            .with_vector_store(VectorStore::new(Arc::new(StubEmbeddings::default()), index));

        let error = service
            .chat(ChatRequest {
                message: "hello".into(),
                k: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(error, ProcessingError::Configuration(_)));
    }

    #[tokio::test]
    async fn zero_k_is_invalid_input() {
        let server = MockServer::start_async().await;
        let service = ready_service(&server, Arc::new(RecordingChat::default()));
        let error = service.search("anything", Some(0)).await.unwrap_err();
        assert!(matches!(error, ProcessingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn chat_prompts_with_labeled_context_and_returns_sources() {
        let server = MockServer::start_async().await;
        let query = server
            .mock_async(|when, then| {
                when.method(POST).path("/query").body_contains("\"topK\":4");
                then.status(200).json_body(json!({
                    "matches": [
                        {
                            "id": "a",
                            "score": 0.9,
                            "metadata": {
                                "text": "Transformers use attention.",
                                "documentName": "doc1"
                            }
                        },
                        {
                            "id": "b",
                            "score": 0.7,
                            "metadata": {
                                "text": "No recurrence is needed.",
                                "documentName": "doc1"
                            }
                        }
                    ]
                }));
            })
            .await;

        let chat = Arc::new(RecordingChat::default());
        let service = ready_service(&server, chat.clone());
        let outcome = service
            .chat(ChatRequest {
                message: "What architecture is proposed?".into(),
                k: None,
            })
            .await
            .expect("chat");

        query.assert_async().await;
        assert_eq!(outcome.response, "It is a transformer.");
        assert_eq!(outcome.relevant_documents.len(), 2);
        assert_eq!(outcome.relevant_documents[0].document_name(), Some("doc1"));

        let prompts = chat.prompts.lock().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(
            "Document 1:\nTransformers use attention.\n\nDocument 2:\nNo recurrence is needed."
        ));
        assert!(prompts[0].ends_with("Question: What architecture is proposed?\n\nAnswer:"));
        assert_eq!(service.metrics_snapshot().chat_requests, 1);
    }

    #[tokio::test]
    async fn store_tags_every_chunk_with_the_default_name() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .body_contains("\"documentName\":\"unnamed\"");
                then.status(200).json_body(json!({ "upsertedCount": 2 }));
            })
            .await;

        let service = ready_service(&server, Arc::new(RecordingChat::default()));
        let stored = service
            .store(vec![Document::new("one"), Document::new("two")], "  ")
            .await
            .expect("store");

        upsert.assert_async().await;
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn concurrent_first_stores_resolve_the_index_once() {
        let server = MockServer::start_async().await;
        let describe = server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes/papers");
                then.status(200)
                    .delay(Duration::from_millis(200))
                    .json_body(json!({
                        "name": "papers",
                        "host": "papers-abc123.svc.pinecone.io",
                        "dimension": 1536
                    }));
            })
            .await;

        let controller = server.base_url();
        let service = RagService::new(config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("PINECONE_INDEX_NAME", "papers"),
            ("PINECONE_CONTROLLER_URL", controller.as_str()),
        ]))
        .expect("service");
        assert!(!service.is_ready());

        let (first, second) = tokio::join!(
            service.store(Vec::new(), "first"),
            service.store(Vec::new(), "second")
        );

        assert_eq!(first.expect("first store"), 0);
        assert_eq!(second.expect("second store"), 0);
        assert_eq!(describe.hits_async().await, 1);
        assert!(service.is_ready());
    }
}
