//! Search-store error types.
//!
//! This module defines the error kinds that can occur during search-store
//! operations.

use thiserror::Error;

/// Errors that can occur during search-store operations.
#[derive(Debug, Clone, Error)]
pub enum SearchStoreError {
    /// Failed to establish a connection to the search store.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request could not be sent or the response not read.
    #[error("Request error: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("Transport error, status {status}: {reason}")]
    Transport { status: u16, reason: String },

    /// Document or index not found.
    #[error("Not found: index {index}, id {id}")]
    NotFound { index: String, id: String },

    /// Failed to serialize or deserialize a document body.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SearchStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create a transport error from a response status and body.
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            status,
            reason: reason.into(),
        }
    }

    /// Create a not-found error for a document or index.
    pub fn not_found(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            index: index.into(),
            id: id.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether this error is a missing document or index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
