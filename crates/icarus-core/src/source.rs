//! Record source contracts.
//!
//! The engine never reads files itself. Two adapters feed it: a bulk JSON
//! snapshot source and a line-oriented journal source. Both report what they
//! read through [`IngestHooks`], which the engine hands them explicitly at
//! `load`/`watch` time.
//!
//! Implementations must not hold internal locks while invoking a hook: the
//! hooks call back into [`LogQuery::stats`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use icarus_types::{LoadedFile, LogEvent};

/// Errors raised by record sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The background watcher could not be started.
    #[error("watch error: {0}")]
    Watch(String),
}

/// Callbacks invoked by sources for every file and record they read.
pub trait IngestHooks: Send + Sync {
    /// A file was read (or re-read).
    fn on_file_loaded(&self, file: &LoadedFile);

    /// A new, distinct journal record was parsed.
    fn on_record_parsed(&self, record: &LogEvent);
}

/// Counters the journal source maintains itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSourceStats {
    /// Distinct records imported so far.
    pub events_imported: u64,
    /// Timestamp of the newest record seen.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Read access to the records a journal source has imported.
pub trait LogQuery: Send + Sync {
    /// Most recent record with the given event name.
    fn latest(&self, event_name: &str) -> Option<LogEvent>;

    /// All records at or after `since`, oldest first.
    fn from_timestamp(&self, since: DateTime<Utc>) -> Vec<LogEvent>;

    /// The newest `count` records, newest first.
    fn newest(&self, count: usize) -> Vec<LogEvent>;

    /// Import counters.
    fn stats(&self) -> LogSourceStats;
}

/// The continuously appended journal.
#[async_trait]
pub trait LogSource: LogQuery {
    /// Replay every journal file inside the trailing `window_days`.
    async fn load(&self, window_days: u32, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError>;

    /// Start tailing for appended records and new files.
    fn watch(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError>;
}

/// The bulk JSON snapshot files.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Read every snapshot file once.
    async fn load(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError>;

    /// Start re-reading snapshot files when they change.
    fn watch(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError>;
}
