//! Chain domain types.
//!
//! Defines the row structures delivered by the delta stream and the naming
//! rules that map them onto searchable records.

pub mod chain_document;
pub mod chain_edge;
pub mod naming;

pub use chain_document::{format_timestamp, ChainContent, ChainDocument, ContentType};
pub use chain_edge::ChainEdge;
pub use naming::{camel_case_label, edge_field_name, field_name, object_type_name};

/// Reserved content label naming a content group.
pub const CONTENT_GROUP_LABEL: &str = "content_group_label";

/// Reserved content label carrying the document's domain type.
pub const TYPE_LABEL: &str = "type";

/// Group label of the system group, where the `type` content lives.
pub const SYSTEM_GROUP: &str = "system";
