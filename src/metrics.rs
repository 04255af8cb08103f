use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing upload and chat activity.
#[derive(Default)]
pub struct RagMetrics {
    documents_uploaded: AtomicU64,
    chunks_stored: AtomicU64,
    chat_requests: AtomicU64,
}

impl RagMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed upload and the number of chunks it stored.
    pub fn record_upload(&self, chunk_count: u64) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
        self.chunks_stored.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an answered chat request.
    pub fn record_chat(&self) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            chunks_stored: self.chunks_stored.load(Ordering::Relaxed),
            chat_requests: self.chat_requests.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Uploads that completed since startup.
    pub documents_uploaded: u64,
    /// Total chunks stored across all uploads.
    pub chunks_stored: u64,
    /// Chat requests answered since startup.
    pub chat_requests: u64,
}
