//! # Doc Indexer
//!
//! Top-level crate for the document-graph search indexer.
//!
//! This crate wires the projection pipeline to its search store, exposes
//! the telemetry bootstrap, and hands the external firehose client
//! everything it needs to drive the stream: a configured
//! [`doc_indexer_pipeline::DeltaStreamHandler`] and the
//! [`doc_indexer_pipeline::StreamRequest`] describing where to resume.

pub mod config;
pub mod monitoring;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] doc_indexer_pipeline::ConfigError),

    /// Projection error.
    #[error("Projection error: {0}")]
    Projection(#[from] doc_indexer_pipeline::ProjectionError),

    /// Search-store error.
    #[error("Store error: {0}")]
    Store(#[from] doc_indexer_repository::SearchStoreError),

    /// Telemetry or metrics setup error.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl IndexerError {
    /// Create a telemetry error.
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }
}
