//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and the optional metrics exporter
//! - Bind the listener once everything else is ready

use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ListenerConfig, ObservabilityConfig, RouterConfig};
use crate::observability::{logging, metrics};

/// Load `path` when given, otherwise fall back to defaults.
pub fn load(path: Option<&Path>) -> Result<RouterConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(RouterConfig::default()),
    }
}

/// Install logging and, when enabled, the Prometheus exporter.
pub fn init_observability(config: &ObservabilityConfig) {
    if let Err(e) = logging::init(config) {
        eprintln!("logging already initialized: {e}");
    }

    if config.metrics_enabled {
        match config.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

pub async fn bind_listener(config: &ListenerConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
