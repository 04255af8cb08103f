//! The unit of text flowing through the pipeline: extracted pages and their chunks.

use serde::Serialize;
use serde_json::{Map, Value};

/// Metadata key carrying the user-supplied document name.
pub const DOCUMENT_NAME_KEY: &str = "documentName";

/// A page or chunk of extracted PDF text with its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    /// Text content.
    pub page_content: String,
    /// Arbitrary JSON metadata (page location, document name, source).
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Name attached at upload time, if any.
    pub fn document_name(&self) -> Option<&str> {
        self.metadata.get(DOCUMENT_NAME_KEY).and_then(Value::as_str)
    }
}
