//! # Doc Indexer Pipeline
//!
//! This crate provides the projection pipeline that consumes table-row
//! deltas from a blockchain firehose stream and indexes them into the
//! search store.
//!
//! ## Architecture
//!
//! 1. **Stream handler**: maps upstream deltas onto projection operations
//! 2. **Parser**: flattens on-chain documents into searchable records
//! 3. **Projector**: applies document and edge mutations and keeps the
//!    stream cursor
//! 4. **Search store**: the storage contract, provided by
//!    `doc-indexer-repository`

pub mod config;
pub mod domain;
pub mod errors;
pub mod parser;
pub mod projection;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, ContractConfig, IndexerConfig, SingleTextOp};
pub use domain::{ChainDocument, ChainEdge};
pub use errors::{ParseError, ProjectionError};
pub use parser::DocumentParser;
pub use projection::DocumentProjector;
pub use stream::{DeltaOperation, DeltaStreamHandler, ForkStep, StreamRequest, TableDelta};
