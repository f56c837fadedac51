//! Error types for search-store operations.

pub mod search_store_error;

pub use search_store_error::SearchStoreError;
