//! Stream handler.
//!
//! Maps upstream table-row deltas onto projection operations. The firehose
//! client delivers deltas in stream order and drives [`DeltaStreamHandler`]
//! one delta at a time; undo steps arrive pre-reversed, so every delta is
//! applied in the direction it states.

use metrics::{counter, gauge};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::IndexerConfig;
use crate::domain::{ChainDocument, ChainEdge};
use crate::errors::ProjectionError;
use crate::projection::DocumentProjector;

/// Counter of stored documents.
pub const CREATED_DOCS_METRIC: &str = "doc_indexer_created_docs";
/// Counter of deleted documents.
pub const DELETED_DOCS_METRIC: &str = "doc_indexer_deleted_docs";
/// Counter of added edges.
pub const CREATED_EDGES_METRIC: &str = "doc_indexer_created_edges";
/// Counter of removed edges.
pub const DELETED_EDGES_METRIC: &str = "doc_indexer_deleted_edges";
/// Gauge tracking the latest seen block number.
pub const BLOCK_NUMBER_METRIC: &str = "doc_indexer_block_number";

/// The operation a delta applies to its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOperation {
    Insert,
    Update,
    Remove,
}

/// Fork step a delta was delivered under.
///
/// Undo rows are already reversed by the stream client, so the handler
/// applies every step the same way; the step is carried for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkStep {
    New,
    Undo,
    Irreversible,
}

/// One upstream notification: one row, one operation.
#[derive(Debug, Clone)]
pub struct TableDelta {
    /// Contract account the row belongs to.
    pub code: String,
    /// Table the row lives in.
    pub table_name: String,
    pub operation: DeltaOperation,
    /// Row JSON after the operation (insert/update).
    pub new_data: Option<Vec<u8>>,
    /// Row JSON before the operation (remove).
    pub old_data: Option<Vec<u8>>,
    pub block_number: u64,
    /// Opaque resume point identifying this delta in the stream.
    pub cursor: String,
    pub fork_step: ForkStep,
}

/// Stream subscription parameters handed to the firehose client.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// First block to stream when no cursor is persisted.
    pub start_block: i64,
    /// Persisted cursor to resume from; empty means start at `start_block`.
    pub start_cursor: String,
    /// Requested heartbeat frequency, in blocks.
    pub heartbeat_frequency: u32,
}

/// Applies stream deltas to the projection engine.
///
/// Errors returned by [`DeltaStreamHandler::on_delta`] are fatal: the
/// cursor was not advanced, and the caller must stop the stream so a
/// restart replays the failed delta.
pub struct DeltaStreamHandler {
    projector: DocumentProjector,
    config: Arc<IndexerConfig>,
    cursor: String,
    latest_block: u64,
}

impl DeltaStreamHandler {
    /// Create a handler over a projector.
    pub fn new(projector: DocumentProjector, config: Arc<IndexerConfig>) -> Self {
        Self {
            projector,
            config,
            cursor: String::new(),
            latest_block: 0,
        }
    }

    /// The projection engine this handler drives.
    pub fn projector(&self) -> &DocumentProjector {
        &self.projector
    }

    /// The cursor of the last seen delta (not necessarily persisted).
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// The highest block number seen on the stream.
    pub fn latest_block(&self) -> u64 {
        self.latest_block
    }

    /// Apply one delta.
    #[instrument(skip(self, delta), fields(code = %delta.code, table = %delta.table_name, block = delta.block_number))]
    pub async fn on_delta(&mut self, delta: &TableDelta) -> Result<(), ProjectionError> {
        debug!(
            cursor = %delta.cursor,
            operation = ?delta.operation,
            fork_step = ?delta.fork_step,
            "Received delta"
        );

        if let Some(contract) = self.config.contract(&delta.code) {
            if delta.table_name == contract.doc_table_name {
                match delta.operation {
                    DeltaOperation::Insert | DeltaOperation::Update => {
                        let doc: ChainDocument =
                            decode_row(delta.new_data.as_deref(), "document new data")?;
                        self.projector
                            .store_document(&doc, &delta.cursor, contract)
                            .await?;
                        counter!(CREATED_DOCS_METRIC).increment(1);
                    }
                    DeltaOperation::Remove => {
                        let doc: ChainDocument =
                            decode_row(delta.old_data.as_deref(), "document old data")?;
                        self.projector
                            .delete_document(&doc, &delta.cursor, contract)
                            .await?;
                        counter!(DELETED_DOCS_METRIC).increment(1);
                    }
                }
            } else if delta.table_name == contract.edge_table_name {
                match delta.operation {
                    DeltaOperation::Insert => {
                        let edge: ChainEdge =
                            decode_row(delta.new_data.as_deref(), "edge new data")?;
                        self.projector
                            .mutate_edge(&edge, false, &delta.cursor, contract)
                            .await?;
                        counter!(CREATED_EDGES_METRIC).increment(1);
                    }
                    DeltaOperation::Remove => {
                        let edge: ChainEdge =
                            decode_row(delta.old_data.as_deref(), "edge old data")?;
                        self.projector
                            .mutate_edge(&edge, true, &delta.cursor, contract)
                            .await?;
                        counter!(DELETED_EDGES_METRIC).increment(1);
                    }
                    DeltaOperation::Update => {
                        // Edge rows are only ever inserted or removed; an
                        // update means the stream no longer matches the
                        // chain contract.
                        return Err(ProjectionError::protocol(format!(
                            "UPDATE on edge table {} of {} at block {}",
                            delta.table_name, delta.code, delta.block_number
                        )));
                    }
                }
            } else {
                debug!("Delta for untracked table, ignoring");
            }
        } else {
            debug!("Delta for unconfigured contract, ignoring");
        }

        gauge!(BLOCK_NUMBER_METRIC).set(delta.block_number as f64);
        self.latest_block = delta.block_number;
        self.cursor = delta.cursor.clone();
        Ok(())
    }

    /// Persist the heartbeat cursor so idle streams still move the resume
    /// point forward.
    pub async fn on_heartbeat(
        &mut self,
        block_number: u64,
        cursor: &str,
    ) -> Result<(), ProjectionError> {
        debug!(block = block_number, cursor = %cursor, "Heartbeat");
        self.projector.update_cursor(cursor).await?;
        gauge!(BLOCK_NUMBER_METRIC).set(block_number as f64);
        self.latest_block = block_number;
        self.cursor = cursor.to_string();
        Ok(())
    }
}

fn decode_row<T: DeserializeOwned>(
    data: Option<&[u8]>,
    context: &str,
) -> Result<T, ProjectionError> {
    let data = data.ok_or_else(|| ProjectionError::decode(format!("{} is empty", context)))?;
    serde_json::from_slice(data)
        .map_err(|e| ProjectionError::decode(format!("failed decoding {}: {}", context, e)))
}
