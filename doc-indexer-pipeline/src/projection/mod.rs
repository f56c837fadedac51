//! Projection engine.
//!
//! Applies document upserts, document deletions, and edge mutations to the
//! search store, and keeps the stream cursor. Writes that belong to one
//! delta happen in a fixed order: data first, cursor second, so a crash
//! between the two replays at most one delta on restart.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use doc_indexer_repository::SearchStore;

use crate::config::{ContractConfig, IndexerConfig};
use crate::domain::{edge_field_name, ChainDocument, ChainEdge};
use crate::errors::ProjectionError;
use crate::parser::{DocumentParser, DOC_ID_FIELD, EDGES_FIELD, TYPE_FIELD};

/// Id of the single cursor record.
pub const CURSOR_DOC_ID: &str = "c1";

/// Field of the cursor record holding the cursor string.
pub const CURSOR_FIELD: &str = "cursor";

/// Projects chain rows into the search store.
pub struct DocumentProjector {
    store: Arc<dyn SearchStore>,
    config: Arc<IndexerConfig>,
    parser: DocumentParser,
}

impl DocumentProjector {
    /// Create a projector and ensure the per-contract indices exist.
    pub async fn new(
        store: Arc<dyn SearchStore>,
        config: Arc<IndexerConfig>,
    ) -> Result<Self, ProjectionError> {
        let projector = Self {
            parser: DocumentParser::from_config(&config),
            store,
            config,
        };
        projector.configure_indexes().await?;
        Ok(projector)
    }

    /// Create the document index of every configured contract when absent.
    ///
    /// The cursor index needs no provisioning; it is created implicitly by
    /// the first cursor write.
    async fn configure_indexes(&self) -> Result<(), ProjectionError> {
        info!("Configuring indexes");
        for contract in &self.config.contracts {
            let index = &contract.index_name;
            if !self.store.index_exists(index).await? {
                info!(index = %index, "Index does not exist, creating base index");
                self.store.upsert_index(index).await?;
            }
        }
        Ok(())
    }

    /// Create or replace a document, preserving its stored edges.
    #[instrument(skip(self, chain_doc, contract), fields(doc_id = %chain_doc.doc_id(), index = %contract.index_name))]
    pub async fn store_document(
        &self,
        chain_doc: &ChainDocument,
        cursor: &str,
        contract: &ContractConfig,
    ) -> Result<(), ProjectionError> {
        let mut doc = self.parser.parse(chain_doc)?;
        let doc_id = chain_doc.doc_id();

        // A full upsert would wipe the adjacency map, which only edge
        // deltas maintain; carry it over from the stored version.
        if let Some(existing) = self
            .get_document(&doc_id, &contract.index_name, Some(&[EDGES_FIELD]))
            .await?
        {
            if let Some(edges) = existing.get(EDGES_FIELD) {
                doc.insert(EDGES_FIELD.to_string(), edges.clone());
            }
        }

        debug!(cursor = %cursor, "Storing parsed document");
        self.store
            .upsert(&contract.index_name, &doc_id, &Value::Object(doc))
            .await?;
        self.update_cursor(cursor).await
    }

    /// Delete a document; absence is not an error.
    #[instrument(skip(self, chain_doc, contract), fields(doc_id = %chain_doc.doc_id(), index = %contract.index_name))]
    pub async fn delete_document(
        &self,
        chain_doc: &ChainDocument,
        cursor: &str,
        contract: &ContractConfig,
    ) -> Result<(), ProjectionError> {
        debug!(cursor = %cursor, "Deleting document");
        self.store
            .delete(&contract.index_name, &chain_doc.doc_id(), false)
            .await?;
        self.update_cursor(cursor).await
    }

    /// Add or remove one edge on its from-document's adjacency map.
    ///
    /// Every condition that prevents the mutation (missing or untyped
    /// endpoint, blacklisted pair, no-op add/remove) is a skip: it logs,
    /// leaves the data untouched, and still advances the cursor.
    #[instrument(skip(self, chain_edge, contract), fields(from = %chain_edge.from, to = %chain_edge.to, index = %contract.index_name))]
    pub async fn mutate_edge(
        &self,
        chain_edge: &ChainEdge,
        delete_op: bool,
        cursor: &str,
        contract: &ContractConfig,
    ) -> Result<(), ProjectionError> {
        let edge_name = edge_field_name(&chain_edge.edge_name);
        let edges_path = format!("{}.{}", EDGES_FIELD, edge_name);
        let from_fields = [DOC_ID_FIELD, TYPE_FIELD, edges_path.as_str()];
        let to_fields = [DOC_ID_FIELD, TYPE_FIELD];

        let Some(from_doc) = self
            .get_document(&chain_edge.from, &contract.index_name, Some(&from_fields))
            .await?
        else {
            warn!(edge = %edge_name, "FROM document not found, skipping edge");
            return self.update_cursor(cursor).await;
        };

        let Some(to_doc) = self
            .get_document(&chain_edge.to, &contract.index_name, Some(&to_fields))
            .await?
        else {
            warn!(edge = %edge_name, "TO document not found, skipping edge");
            return self.update_cursor(cursor).await;
        };

        let Some(from_type) = from_doc.get(TYPE_FIELD).and_then(Value::as_str) else {
            warn!(edge = %edge_name, "FROM document has no type, skipping edge");
            return self.update_cursor(cursor).await;
        };
        let Some(to_type) = to_doc.get(TYPE_FIELD).and_then(Value::as_str) else {
            warn!(edge = %edge_name, "TO document has no type, skipping edge");
            return self.update_cursor(cursor).await;
        };

        if contract
            .edge_black_list
            .is_black_listed(from_type, to_type, &edge_name)
        {
            info!(edge = %edge_name, from_type = %from_type, to_type = %to_type, "Edge black listed, skipping");
            return self.update_cursor(cursor).await;
        }

        let (Some(from_id), Some(to_id)) = (
            from_doc.get(DOC_ID_FIELD).and_then(Value::as_str),
            to_doc.get(DOC_ID_FIELD).and_then(Value::as_str),
        ) else {
            warn!(edge = %edge_name, "Endpoint document has no docId, skipping edge");
            return self.update_cursor(cursor).await;
        };

        let mut targets: Vec<Value> = from_doc
            .get(EDGES_FIELD)
            .and_then(|edges| edges.get(&edge_name))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let pos = targets.iter().position(|value| value.as_str() == Some(to_id));
        let updated = match (pos, delete_op) {
            (None, false) => {
                debug!(edge = %edge_name, to_id = %to_id, "Adding edge target");
                targets.push(Value::String(to_id.to_string()));
                true
            }
            (Some(pos), true) => {
                debug!(edge = %edge_name, to_id = %to_id, "Removing edge target");
                targets.remove(pos);
                true
            }
            _ => false,
        };

        if updated {
            let mut edge_map = Map::new();
            edge_map.insert(edge_name, Value::Array(targets));
            let mut patch = Map::new();
            patch.insert(EDGES_FIELD.to_string(), Value::Object(edge_map));
            self.store
                .update(&contract.index_name, from_id, &Value::Object(patch))
                .await?;
        } else {
            warn!(edge = %edge_name, delete_op = delete_op, "Edge mutation caused no change, skipping");
        }

        self.update_cursor(cursor).await
    }

    /// Persist the stream cursor.
    pub async fn update_cursor(&self, cursor: &str) -> Result<(), ProjectionError> {
        let mut record = Map::new();
        record.insert(CURSOR_FIELD.to_string(), Value::String(cursor.to_string()));
        self.store
            .upsert(
                &self.config.cursor_index_name,
                CURSOR_DOC_ID,
                &Value::Object(record),
            )
            .await?;
        Ok(())
    }

    /// The persisted cursor, or the empty string when none was written yet.
    ///
    /// An empty cursor tells the stream client to start from the configured
    /// start block.
    pub async fn get_cursor(&self) -> Result<String, ProjectionError> {
        match self
            .store
            .get(&self.config.cursor_index_name, CURSOR_DOC_ID, None)
            .await
        {
            Ok(record) => Ok(record
                .get(CURSOR_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()),
            Err(e) if e.is_not_found() => {
                info!("Cursor does not exist");
                Ok(String::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a cursor record was persisted.
    pub async fn cursor_exists(&self) -> Result<bool, ProjectionError> {
        Ok(self
            .store
            .document_exists(&self.config.cursor_index_name, CURSOR_DOC_ID)
            .await?)
    }

    /// Fetch a document, optionally projected; absence yields `None`.
    pub async fn get_document(
        &self,
        doc_id: &str,
        index: &str,
        fields: Option<&[&str]>,
    ) -> Result<Option<Map<String, Value>>, ProjectionError> {
        match self.store.get(index, doc_id, fields).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_not_found() => {
                debug!(doc_id = %doc_id, index = %index, "Document does not exist");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a document exists.
    pub async fn document_exists(&self, doc_id: &str, index: &str) -> Result<bool, ProjectionError> {
        Ok(self.store.document_exists(index, doc_id).await?)
    }

    /// Whether an index exists.
    pub async fn index_exists(&self, index: &str) -> Result<bool, ProjectionError> {
        Ok(self.store.index_exists(index).await?)
    }

    /// Delete an index if present.
    pub async fn delete_index(&self, index: &str) -> Result<(), ProjectionError> {
        if self.store.index_exists(index).await? {
            self.store.delete_index(index).await?;
        }
        Ok(())
    }
}
