//! Telemetry and metrics bootstrap.
//!
//! The pipeline records its counters and gauges through the `metrics`
//! facade; `install_metrics` makes them scrapeable by starting the
//! Prometheus exporter. Both functions are meant to be called once, at
//! process startup.

use std::net::{Ipv4Addr, SocketAddr};

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::IndexerError;

/// Initialize the tracing subscriber, filtered by `RUST_LOG`.
pub fn init_telemetry() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Start the Prometheus exporter on the given port.
///
/// Must run inside a tokio runtime; the exporter serves scrapes from a
/// background task and shares no state with the projection path.
pub fn install_metrics(port: u16) -> Result<(), IndexerError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| IndexerError::telemetry(e.to_string()))?;

    info!(port = port, "Prometheus exporter listening");
    Ok(())
}
