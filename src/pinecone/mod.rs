//! Pinecone vector index integration.

pub mod client;
pub mod metadata;
pub mod types;

pub use client::PineconeService;
pub use metadata::{flatten_metadata, nest_metadata};
pub use types::{PineconeError, QueryMatch, Vector};
