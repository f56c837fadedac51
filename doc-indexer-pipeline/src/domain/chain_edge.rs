//! On-chain edge rows.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::chain_document::U64OrString;
use crate::domain::naming::edge_field_name;

/// A directed, named relation between two documents.
///
/// Edge names arrive dotted (`start.period`); the stored adjacency key is
/// the camel-cased form produced by [`ChainEdge::doc_edge_name`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEdge {
    pub edge_name: String,
    #[serde(rename = "from_node", deserialize_with = "de_node_id")]
    pub from: String,
    #[serde(rename = "to_node", deserialize_with = "de_node_id")]
    pub to: String,
}

impl ChainEdge {
    /// Create an edge from its parts.
    pub fn new(
        edge_name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            edge_name: edge_name.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// The camel-cased adjacency key this edge is stored under.
    pub fn doc_edge_name(&self) -> String {
        edge_field_name(&self.edge_name)
    }
}

fn de_node_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match U64OrString::deserialize(deserializer)? {
        U64OrString::U64(v) => v.to_string(),
        U64OrString::String(s) => s,
    })
}
