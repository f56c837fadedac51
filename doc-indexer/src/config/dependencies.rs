//! Dependency initialization and wiring for the indexer.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::IndexerError;
use doc_indexer_pipeline::{
    DeltaStreamHandler, DocumentProjector, IndexerConfig, StreamRequest,
};
use doc_indexer_repository::{OpenSearchStore, SearchStoreConfig};

/// Environment variable carrying the search-store user name.
const ES_USER_ENV: &str = "ES_USER";

/// Environment variable carrying the search-store password.
const ES_PASSWORD_ENV: &str = "ES_PASSWORD";

/// Container for all initialized dependencies.
///
/// The firehose client is external: it subscribes with `stream_request`
/// and drives `handler` one delta at a time, in stream order.
pub struct Dependencies {
    /// The configured stream handler ready to receive deltas.
    pub handler: DeltaStreamHandler,
    /// Subscription parameters for the stream client, including the
    /// persisted resume cursor.
    pub stream_request: StreamRequest,
    /// The loaded pipeline configuration.
    pub config: Arc<IndexerConfig>,
}

impl Dependencies {
    /// Initialize all dependencies from a configuration file.
    ///
    /// Loads and validates the configuration, connects the search store
    /// (credentials from `ES_USER`/`ES_PASSWORD` when set), ensures the
    /// per-contract indices exist, and reads the persisted cursor.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexerError)` - If loading, validation, or store setup fails
    pub async fn init(config_path: &str) -> Result<Self, IndexerError> {
        let config = Arc::new(IndexerConfig::load(config_path)?);

        info!(
            contracts = config.contracts.len(),
            endpoint = %config.opensearch_endpoint,
            cursor_index = %config.cursor_index_name,
            "Loaded configuration"
        );

        let store_config = match (env::var(ES_USER_ENV), env::var(ES_PASSWORD_ENV)) {
            (Ok(username), Ok(password)) => SearchStoreConfig::with_basic_auth(
                config.opensearch_endpoint.clone(),
                username,
                password,
            ),
            _ => SearchStoreConfig::new(config.opensearch_endpoint.clone()),
        };
        let store = Arc::new(OpenSearchStore::new(&store_config)?);

        let projector = DocumentProjector::new(store, config.clone()).await?;

        let start_cursor = projector.get_cursor().await?;
        info!(cursor = %start_cursor, start_block = config.start_block, "Stream resume point");

        let stream_request = StreamRequest {
            start_block: config.start_block,
            start_cursor,
            heartbeat_frequency: config.heart_beat_frequency,
        };

        let handler = DeltaStreamHandler::new(projector, config.clone());

        Ok(Self {
            handler,
            stream_request,
            config,
        })
    }
}
