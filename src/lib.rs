#![deny(missing_docs)]

//! Core library for the paperchat PDF question-answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Chat completion client abstraction and adapters.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Text-with-metadata unit shared by every pipeline stage.
pub mod document;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Upload and chat metrics helpers.
pub mod metrics;
mod openai;
/// PDF download, page editing, and text extraction.
pub mod pdf;
/// Pinecone vector index integration.
pub mod pinecone;
/// Upload and chat pipeline orchestration.
pub mod processing;
