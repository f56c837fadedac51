//! Pipeline configuration.
//!
//! Loaded from a YAML file with kebab-case keys. `load`/`from_yaml`
//! validate the raw structure and derive the per-contract and cursor index
//! names before the configuration is handed to the rest of the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::ContentType;

/// Suffix of every per-contract document index.
pub const DOCUMENT_INDEX_SUFFIX: &str = "documents";

/// Suffix of the cursor index.
pub const CURSOR_INDEX_SUFFIX: &str = "cursor";

fn index_name(prefix: &str, suffix: &str) -> String {
    format!("{}-{}", prefix, suffix)
}

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed parsing config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("at least one contract must be configured")]
    NoContracts,

    #[error("contract '{0}' was configured more than once")]
    DuplicateContract(String),

    #[error("required property '{0}' is missing or empty")]
    MissingField(&'static str),
}

/// How a content type participates in the combined search field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleTextOp {
    /// Field passes through; value not accumulated.
    #[default]
    None,
    /// Field passes through and its value is accumulated.
    Include,
    /// Field is omitted; only its value is accumulated.
    Replace,
}

/// A blacklist entry; any component may be the wildcard `*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeBlacklistEntry {
    pub from: String,
    pub to: String,
    pub name: String,
}

impl EdgeBlacklistEntry {
    /// Create an entry from its parts.
    pub fn new(from: impl Into<String>, to: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: name.into(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.from.is_empty() {
            return Err(ConfigError::MissingField("edge-black-list.from"));
        }
        if self.to.is_empty() {
            return Err(ConfigError::MissingField("edge-black-list.to"));
        }
        if self.name.is_empty() {
            return Err(ConfigError::MissingField("edge-black-list.name"));
        }
        Ok(())
    }

    fn matches(&self, from: &str, to: &str, name: &str) -> bool {
        (self.from == from || self.from == "*")
            && (self.to == to || self.to == "*")
            && (self.name == name || self.name == "*")
    }
}

/// Set of suppressed `(fromType, toType, edgeName)` patterns.
///
/// Evaluation is a boolean OR across entries; ordering is irrelevant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeBlacklist(Vec<EdgeBlacklistEntry>);

impl EdgeBlacklist {
    /// Create a blacklist from entries.
    pub fn new(entries: Vec<EdgeBlacklistEntry>) -> Self {
        Self(entries)
    }

    /// Whether a mutation on `(from, to, name)` is suppressed.
    ///
    /// `name` is the camel-cased adjacency key, matching how entries are
    /// written in configuration.
    pub fn is_black_listed(&self, from: &str, to: &str, name: &str) -> bool {
        self.0.iter().any(|entry| entry.matches(from, to, name))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.0 {
            entry.validate()?;
        }
        Ok(())
    }
}

/// Per-contract stream and index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractConfig {
    /// The upstream code whose rows this contract absorbs.
    pub name: String,
    /// Table carrying document rows.
    pub doc_table_name: String,
    /// Table carrying edge rows.
    pub edge_table_name: String,
    /// Prefix of this contract's document index.
    pub index_prefix: String,
    #[serde(default)]
    pub edge_black_list: EdgeBlacklist,
    /// Derived document index name, filled in by [`ContractConfig::init`].
    #[serde(skip)]
    pub index_name: String,
}

impl ContractConfig {
    /// Validate the contract settings and derive the index name.
    pub fn init(&mut self) -> Result<(), ConfigError> {
        self.validate()?;
        self.index_name = index_name(&self.index_prefix, DOCUMENT_INDEX_SUFFIX);
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingField("contracts.name"));
        }
        if self.doc_table_name.is_empty() {
            return Err(ConfigError::MissingField("contracts.doc-table-name"));
        }
        if self.edge_table_name.is_empty() {
            return Err(ConfigError::MissingField("contracts.edge-table-name"));
        }
        if self.index_prefix.is_empty() {
            return Err(ConfigError::MissingField("contracts.index-prefix"));
        }
        self.edge_black_list.validate()
    }
}

fn default_heart_beat_frequency() -> u32 {
    100
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexerConfig {
    pub contracts: Vec<ContractConfig>,
    pub cursor_index_prefix: String,
    /// Endpoint of the firehose serving the delta stream.
    #[serde(default)]
    pub firehose_endpoint: String,
    /// API key presented to the firehose, when it requires one.
    #[serde(default)]
    pub firehose_api_key: String,
    /// Endpoint of the search store.
    #[serde(default)]
    pub opensearch_endpoint: String,
    /// Port the Prometheus exporter listens on.
    #[serde(default)]
    pub prometheus_port: u16,
    /// Block to start streaming from when no cursor is persisted.
    #[serde(default)]
    pub start_block: i64,
    /// Heartbeat frequency requested from the stream, in blocks.
    #[serde(default = "default_heart_beat_frequency")]
    pub heart_beat_frequency: u32,
    /// Per-content-type policy for the combined search field.
    #[serde(default)]
    pub single_text_search_field: BTreeMap<ContentType, SingleTextOp>,
    /// Emit a `_s` string sibling for every int64 field.
    #[serde(default)]
    pub add_ints_as_strings: bool,
    /// Derived cursor index name, filled in on load.
    #[serde(skip)]
    pub cursor_index_name: String,
}

impl IndexerConfig {
    /// Load and validate the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate the configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.finalize()?;
        Ok(config)
    }

    /// Validate the raw structure and derive index names.
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        if self.contracts.is_empty() {
            return Err(ConfigError::NoContracts);
        }

        let mut seen = HashSet::new();
        for contract in &mut self.contracts {
            contract.init()?;
            if !seen.insert(contract.name.clone()) {
                return Err(ConfigError::DuplicateContract(contract.name.clone()));
            }
        }

        if self.cursor_index_prefix.is_empty() {
            return Err(ConfigError::MissingField("cursor-index-prefix"));
        }

        // Entries configured as `none` are equivalent to absent ones.
        self.single_text_search_field
            .retain(|_, op| *op != SingleTextOp::None);

        self.cursor_index_name = index_name(&self.cursor_index_prefix, CURSOR_INDEX_SUFFIX);
        Ok(())
    }

    /// The contract configured for an upstream code, if any.
    pub fn contract(&self, code: &str) -> Option<&ContractConfig> {
        self.contracts.iter().find(|contract| contract.name == code)
    }

    /// The combined-field policy for a content type.
    pub fn single_text_op(&self, content_type: ContentType) -> SingleTextOp {
        self.single_text_search_field
            .get(&content_type)
            .copied()
            .unwrap_or_default()
    }

    /// Whether any content type participates in the combined field.
    pub fn requires_single_text_field(&self) -> bool {
        !self.single_text_search_field.is_empty()
    }
}
