//! REST endpoint handlers.
//!
//! Every handler is a thin shim over one [`Engine`](icarus_core::Engine)
//! operation.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/host-info` | URLs this service is reachable on |
//! | `GET` | `/api/loading-stats` | Loading phase and counters |
//! | `GET` | `/api/commander` | Commander name and credits |
//! | `GET` | `/api/log-entries` | Journal records by count or timestamp |
//! | `GET` | `/api/system` | Current (or named) system |
//! | `POST` | `/api/start` | Run the initial load |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use icarus_core::{LogEntriesQuery, StartOptions};
use icarus_types::{Commander, HostInfo, LoadingStats, LogEvent, SystemInfo};
use serde::Deserialize;
use tracing::debug;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/system`.
#[derive(Debug, Default, Deserialize)]
pub struct SystemQuery {
    /// System to describe; the current system when absent.
    pub name: Option<String>,
}

/// Query parameters for `POST /api/start`.
#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    /// History window in days; the configured window when absent.
    pub days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/host-info`
pub async fn host_info(State(state): State<Arc<AppState>>) -> Json<HostInfo> {
    Json(state.engine.host_info())
}

/// `GET /api/loading-stats`
pub async fn loading_stats(State(state): State<Arc<AppState>>) -> Json<LoadingStats> {
    Json(state.engine.loading_stats())
}

/// `GET /api/commander`
pub async fn commander(State(state): State<Arc<AppState>>) -> Json<Commander> {
    Json(state.engine.commander())
}

/// Journal records, newest `count` (default 100) or every record at or
/// after `timestamp` (RFC 3339).
///
/// `GET /api/log-entries?count=&timestamp=`
pub async fn log_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogEntriesQuery>,
) -> Json<Vec<LogEvent>> {
    let entries = state.engine.log_entries(&query);
    debug!(returned = entries.len(), "Log entries served");
    Json(entries)
}

/// The current system, or `name` when given. `null` when there is no
/// current system.
///
/// `GET /api/system?name=`
pub async fn system(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SystemQuery>,
) -> Result<Json<Option<SystemInfo>>, ObserverError> {
    let name = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let info = state.engine.system(name).await?;
    Ok(Json(info))
}

/// Run the initial load and return the resulting statistics.
///
/// Calls after the first return the current statistics without loading
/// again.
///
/// `POST /api/start?days=`
pub async fn start(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StartQuery>,
) -> Result<Json<LoadingStats>, ObserverError> {
    if query.days == Some(0) {
        return Err(ObserverError::InvalidQuery(
            "days must be at least 1".to_owned(),
        ));
    }
    let stats = state
        .engine
        .start(StartOptions {
            history_window_days: query.days,
        })
        .await?;
    Ok(Json(stats))
}
