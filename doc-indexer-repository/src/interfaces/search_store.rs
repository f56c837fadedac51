//! Search-store trait definition.
//!
//! This module defines the abstract interface over the search engine,
//! allowing for different backend implementations (OpenSearch,
//! Elasticsearch, etc.) and in-memory test doubles.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::SearchStoreError;

/// Abstracts the underlying search store (OpenSearch, Elasticsearch, etc.).
///
/// The projection path issues interleaved reads and writes against the same
/// documents, so implementations must provide read-your-writes visibility:
/// a `get` that follows a successful `upsert`/`update`/`delete` of the same
/// `(index, id)` sees its effect. Backends achieve this by refreshing on
/// every write.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchStoreError>;

    /// Create an index with an empty mapping.
    ///
    /// Callers are expected to check `index_exists` first; creating an index
    /// that already exists is an error.
    async fn upsert_index(&self, index: &str) -> Result<(), SearchStoreError>;

    /// Delete an index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was deleted
    /// * `Err(SearchStoreError::NotFound)` - If the index does not exist
    async fn delete_index(&self, index: &str) -> Result<(), SearchStoreError>;

    /// Replace or create a document in full.
    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> Result<(), SearchStoreError>;

    /// Merge a partial document into an existing one.
    ///
    /// Object-valued fields merge recursively; scalar and array values
    /// replace the stored value. The document must already exist.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the patch was applied
    /// * `Err(SearchStoreError::NotFound)` - If the document does not exist
    async fn update(&self, index: &str, id: &str, patch: &Value) -> Result<(), SearchStoreError>;

    /// Fetch a document's source, optionally restricted to a set of fields.
    ///
    /// Field names may use dotted paths (`edges.startPeriod`) to project
    /// into nested objects.
    ///
    /// # Returns
    ///
    /// * `Ok(map)` - The (possibly projected) document source
    /// * `Err(SearchStoreError::NotFound)` - If the document or its index is missing
    async fn get(
        &self,
        index: &str,
        id: &str,
        fields: Option<&[&str]>,
    ) -> Result<Map<String, Value>, SearchStoreError>;

    /// Check whether a document exists.
    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchStoreError>;

    /// Delete a document.
    ///
    /// # Arguments
    ///
    /// * `fail_if_absent` - When true, a missing document surfaces as
    ///   `SearchStoreError::NotFound`; when false, absence is ignored.
    async fn delete(
        &self,
        index: &str,
        id: &str,
        fail_if_absent: bool,
    ) -> Result<(), SearchStoreError>;
}
