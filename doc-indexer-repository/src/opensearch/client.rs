//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchStore` using
//! the OpenSearch Rust client. Every write is issued with `refresh=true` so
//! that the projection path reads its own writes.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    params::Refresh,
    DeleteParts, ExistsParts, GetParts, IndexParts, OpenSearch, UpdateParts,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::SearchStoreConfig;
use crate::errors::SearchStoreError;
use crate::interfaces::SearchStore;
use crate::opensearch::index_config::base_index_body;

/// OpenSearch-backed search store.
///
/// # Example
///
/// ```ignore
/// use doc_indexer_repository::{OpenSearchStore, SearchStoreConfig};
///
/// let config = SearchStoreConfig::new("http://localhost:9200");
/// let store = OpenSearchStore::new(&config)?;
/// store.upsert("test1-documents", "2", &doc).await?;
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
}

impl OpenSearchStore {
    /// Create a new store client from connection settings.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new client instance
    /// * `Err(SearchStoreError)` - If the endpoint URL is invalid or the
    ///   transport cannot be built
    pub fn new(config: &SearchStoreConfig) -> Result<Self, SearchStoreError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| SearchStoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }

        let transport = builder
            .build()
            .map_err(|e| SearchStoreError::connection(e.to_string()))?;

        info!(
            endpoint = %config.endpoint,
            authenticated = config.has_credentials(),
            "Created OpenSearch store client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Turn a non-success response into a transport error, consuming the body.
    async fn transport_error(context: &str, response: Response) -> SearchStoreError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status = status, body = %body, "{} request failed", context);
        SearchStoreError::transport(status, format!("{} failed: {}", context, body))
    }
}

#[async_trait]
impl SearchStore for OpenSearchStore {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchStoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            Ok(true)
        } else if status.as_u16() == 404 {
            Ok(false)
        } else {
            Err(Self::transport_error("index exists", response).await)
        }
    }

    async fn upsert_index(&self, index: &str) -> Result<(), SearchStoreError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(base_index_body())
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::transport_error("index create", response).await);
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchStoreError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchStoreError::not_found(index, ""));
        }
        if !status.is_success() {
            return Err(Self::transport_error("index delete", response).await);
        }

        info!(index = %index, "Deleted index");
        Ok(())
    }

    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> Result<(), SearchStoreError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .refresh(Refresh::True)
            .body(doc)
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::transport_error("upsert", response).await);
        }

        debug!(index = %index, id = %id, "Document upserted");
        Ok(())
    }

    async fn update(&self, index: &str, id: &str, patch: &Value) -> Result<(), SearchStoreError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .refresh(Refresh::True)
            .body(json!({ "doc": patch }))
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchStoreError::not_found(index, id));
        }
        if !status.is_success() {
            return Err(Self::transport_error("update", response).await);
        }

        debug!(index = %index, id = %id, "Document updated");
        Ok(())
    }

    async fn get(
        &self,
        index: &str,
        id: &str,
        fields: Option<&[&str]>,
    ) -> Result<Map<String, Value>, SearchStoreError> {
        let mut request = self.client.get(GetParts::IndexId(index, id));
        if let Some(fields) = fields {
            request = request._source_includes(fields);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchStoreError::not_found(index, id));
        }
        if !status.is_success() {
            return Err(Self::transport_error("get", response).await);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        match body.get("_source") {
            Some(Value::Object(source)) => Ok(source.clone()),
            _ => Err(SearchStoreError::serialization(format!(
                "document {}/{} response carried no _source object",
                index, id
            ))),
        }
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchStoreError> {
        let response = self
            .client
            .exists(ExistsParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            Ok(true)
        } else if status.as_u16() == 404 {
            Ok(false)
        } else {
            Err(Self::transport_error("document exists", response).await)
        }
    }

    async fn delete(
        &self,
        index: &str,
        id: &str,
        fail_if_absent: bool,
    ) -> Result<(), SearchStoreError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .refresh(Refresh::True)
            .send()
            .await
            .map_err(|e| SearchStoreError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            if fail_if_absent {
                return Err(SearchStoreError::not_found(index, id));
            }
            debug!(index = %index, id = %id, "Delete of absent document ignored");
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::transport_error("delete", response).await);
        }

        debug!(index = %index, id = %id, "Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_valid_endpoint() {
        let config = SearchStoreConfig::new("http://localhost:9200");
        assert!(OpenSearchStore::new(&config).is_ok());
    }

    #[test]
    fn test_new_with_credentials() {
        let config = SearchStoreConfig::with_basic_auth("https://localhost:9200", "indexer", "pw");
        assert!(OpenSearchStore::new(&config).is_ok());
    }

    #[test]
    fn test_new_with_invalid_endpoint() {
        let config = SearchStoreConfig::new("not a url");
        let result = OpenSearchStore::new(&config);
        assert!(matches!(result, Err(SearchStoreError::Connection(_))));
    }
}
