//! Error types for the projection pipeline.

use doc_indexer_repository::SearchStoreError;
use thiserror::Error;

/// Errors raised while flattening an on-chain document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A content group carried no `content_group_label` content.
    #[error("content group {index} has no content_group_label")]
    MissingGroupLabel { index: usize },

    /// A content value could not be coerced to its declared type.
    #[error("invalid value for content '{label}': {reason}")]
    InvalidValue { label: String, reason: String },
}

impl ParseError {
    /// Create an invalid-value error.
    pub fn invalid_value(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur on the projection path.
///
/// Any of these is fatal at the delta level: the stream must stop without
/// the cursor having advanced, so that a restart replays the failed delta.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The on-chain document was malformed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The search store rejected or failed an operation.
    #[error("Store error: {0}")]
    Store(#[from] SearchStoreError),

    /// A delta payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The upstream stream violated its delta contract.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ProjectionError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::MissingGroupLabel { index: 2 };
        assert_eq!(err.to_string(), "content group 2 has no content_group_label");

        let err = ParseError::invalid_value("time_share_x100", "not an int64");
        assert_eq!(
            err.to_string(),
            "invalid value for content 'time_share_x100': not an int64"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ProjectionError = SearchStoreError::not_found("test1-documents", "2").into();
        assert!(matches!(err, ProjectionError::Store(_)));
    }
}
