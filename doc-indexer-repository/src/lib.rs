//! # Doc Indexer Repository
//!
//! This crate provides the contract and implementations for talking to the
//! search store that backs the document indexer. It includes definitions for
//! errors, the `SearchStore` interface, and a concrete implementation for
//! OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use config::SearchStoreConfig;
pub use errors::SearchStoreError;
pub use interfaces::SearchStore;
pub use opensearch::OpenSearchStore;
