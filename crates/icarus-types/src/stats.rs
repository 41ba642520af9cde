//! Loading statistics reported to clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Where the initial bulk load currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum LoadingPhase {
    /// `start` has not been called yet.
    #[default]
    NotStarted,
    /// Historical files are being replayed.
    InProgress,
    /// Bulk load finished; live tailing is active.
    Complete,
}

/// Point-in-time snapshot of ingestion counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LoadingStats {
    /// Current loading phase.
    pub phase: LoadingPhase,
    /// Distinct files seen across both sources.
    pub files_loaded_count: u64,
    /// Distinct journal records imported, as counted by the log source.
    pub events_imported_count: u64,
    /// Total lines across distinct log files.
    pub log_lines_count: u64,
    /// Total bytes across distinct files.
    pub log_size_bytes: u64,
    /// Per-event-name counts for events with no derived definition.
    pub event_type_counts: BTreeMap<String, u64>,
    /// Timestamp of the newest journal record, if any.
    pub last_activity_time: Option<DateTime<Utc>>,
    /// Milliseconds spent loading (start to end, or start to now).
    pub elapsed_loading_ms: u64,
}
