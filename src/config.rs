use serde::Deserialize;
use std::env;
use thiserror::Error;

const DEFAULT_SERVER_PORT: u16 = 3001;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_CHAT_TEMPERATURE: f64 = 0.7;
const DEFAULT_PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the paperchat server.
///
/// Credentials are optional at load time: a missing key only fails the operation that needs it,
/// through the `require_*` accessors.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the OpenAI embeddings and chat endpoints.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Chat completion model identifier.
    pub chat_model: String,
    /// Fixed sampling temperature for chat completions.
    pub chat_temperature: f64,
    /// API key for Pinecone.
    pub pinecone_api_key: Option<String>,
    /// Name of the Pinecone index backing the vector store.
    pub pinecone_index_name: Option<String>,
    /// Optional data-plane host override; resolved through the control plane when absent.
    pub pinecone_index_host: Option<String>,
    /// Base URL of the Pinecone control plane.
    pub pinecone_controller_url: String,
    /// Optional namespace used for upserts and queries.
    pub pinecone_namespace: Option<String>,
    /// Port the HTTP server listens on.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            embedding_model: optional("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            chat_model: optional("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            chat_temperature: optional("OPENAI_CHAT_TEMPERATURE")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("OPENAI_CHAT_TEMPERATURE".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_CHAT_TEMPERATURE),
            pinecone_api_key: optional("PINECONE_API_KEY"),
            pinecone_index_name: optional("PINECONE_INDEX_NAME"),
            pinecone_index_host: optional("PINECONE_INDEX_HOST"),
            pinecone_controller_url: optional("PINECONE_CONTROLLER_URL")
                .unwrap_or_else(|| DEFAULT_PINECONE_CONTROLLER_URL.to_string()),
            pinecone_namespace: optional("PINECONE_NAMESPACE"),
            server_port: optional("PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
        })
    }

    /// OpenAI credential, or a configuration error naming the missing variable.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        require(self.openai_api_key.as_deref(), "OPENAI_API_KEY")
    }

    /// Pinecone credential, or a configuration error naming the missing variable.
    pub fn require_pinecone_api_key(&self) -> Result<&str, ConfigError> {
        require(self.pinecone_api_key.as_deref(), "PINECONE_API_KEY")
    }

    /// Pinecone index name, or a configuration error naming the missing variable.
    pub fn require_pinecone_index_name(&self) -> Result<&str, ConfigError> {
        require(self.pinecone_index_name.as_deref(), "PINECONE_INDEX_NAME")
    }
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

/// Load `.env` (when present) and build the configuration, logging the non-secret parts.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        server_port = config.server_port,
        embedding_model = %config.embedding_model,
        chat_model = %config.chat_model,
        pinecone_index = ?config.pinecone_index_name,
        has_openai_key = config.openai_api_key.is_some(),
        has_pinecone_key = config.pinecone_api_key.is_some(),
        "Loaded configuration"
    );
    Ok(config)
}
