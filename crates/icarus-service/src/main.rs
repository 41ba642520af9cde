//! ICARUS journal service binary.
//!
//! Wires the journal and snapshot readers, the EDSM client, and the
//! engine together, serves the observer API, then runs the initial load.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `icarus-config.yaml` (or `ICARUS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the record sources and the catalog client
//! 4. Build the engine around the broadcast channel
//! 5. Start the observer API server
//! 6. Run the initial load
//! 7. Serve until Ctrl-C

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use icarus_core::config::LoggingConfig;
use icarus_core::{
    BroadcastSink, Catalog, Collaborators, Engine, EngineSettings, LogSource, ServiceConfig,
    SnapshotSource, StartOptions,
};
use icarus_edsm::EdsmClient;
use icarus_journal::{JournalLog, SnapshotFiles};
use icarus_observer::{AppState, BroadcastChannel};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "icarus-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, server startup, or the initial load
/// fails.
#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // 1. Load configuration.
    let config_path = std::env::var_os("ICARUS_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        journal_dir = %config.journal.dir.display(),
        history_window_days = config.journal.history_window_days,
        port = config.server.port,
        "icarus-service starting"
    );

    // 3. Record sources and catalog.
    let poll_interval = config.journal.poll_interval();
    let log = Arc::new(JournalLog::new(&config.journal.dir, poll_interval));
    let snapshot = Arc::new(SnapshotFiles::new(&config.journal.dir, poll_interval));
    let catalog = Arc::new(EdsmClient::new(&config.edsm)?);
    info!(api_url = catalog.api_url(), "EDSM client ready");

    // 4. Engine and broadcast channel.
    let channel = Arc::new(BroadcastChannel::new());
    let engine = Arc::new(Engine::new(
        Collaborators {
            snapshot: snapshot as Arc<dyn SnapshotSource>,
            log: log as Arc<dyn LogSource>,
            catalog: catalog as Arc<dyn Catalog>,
            sink: Arc::clone(&channel) as Arc<dyn BroadcastSink>,
        },
        EngineSettings::from_config(&config),
    ));

    // 5. Observer API server.
    let state = Arc::new(AppState::new(Arc::clone(&engine), channel));
    let server = icarus_observer::spawn_observer(&config.server, state).await?;

    // 6. Initial load.
    let stats = engine.start(StartOptions::default()).await?;
    info!(
        files = stats.files_loaded_count,
        events = stats.events_imported_count,
        elapsed_ms = stats.elapsed_loading_ms,
        "Ready"
    );

    // 7. Serve until interrupted.
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| ServiceError::Signal { message: e.to_string() })?;
            info!("Shutdown requested");
        }
        result = server => {
            if let Err(e) = result {
                warn!(error = %e, "Observer server task ended unexpectedly");
            }
        }
    }

    info!("icarus-service stopped");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<ServiceConfig, ServiceError> {
    if path.exists() {
        Ok(ServiceConfig::from_file(path)?)
    } else {
        ServiceConfig::parse("").map_err(ServiceError::from)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.journal.poll_interval_ms, 1_000);
        assert_eq!(config.loading.progress_interval_ms, 200);
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icarus-config.yaml");
        std::fs::write(&path, "loading:\n  progress_interval_ms: 500\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.loading.progress_interval_ms, 500);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icarus-config.yaml");
        std::fs::write(&path, "server: [1, 2").unwrap();

        assert!(matches!(load_config(&path), Err(ServiceError::Config { .. })));
    }
}
