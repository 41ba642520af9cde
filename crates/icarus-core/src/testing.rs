//! In-memory stand-ins for the engine's collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use icarus_types::{Body, BroadcastEnvelope, LoadedFile, LogEvent, Station};
use parking_lot::Mutex;

use crate::broadcast::BroadcastSink;
use crate::catalog::{Catalog, CatalogError};
use crate::source::{
    IngestHooks, LogQuery, LogSource, LogSourceStats, SnapshotSource, SourceError,
};

/// Journal source holding records in a `Vec`.
#[derive(Default)]
pub(crate) struct FakeLog {
    records: Mutex<Vec<LogEvent>>,
    backlog: Mutex<Vec<LogEvent>>,
    files: Mutex<Vec<LoadedFile>>,
    pub(crate) loads: AtomicUsize,
    pub(crate) watches: AtomicUsize,
    pub(crate) fail_load: AtomicBool,
    pub(crate) last_window: Mutex<Option<u32>>,
    watcher: Mutex<Option<Arc<dyn IngestHooks>>>,
}

impl FakeLog {
    /// Records that count as already imported.
    pub(crate) fn with_records(records: Vec<LogEvent>) -> Self {
        let log = Self::default();
        *log.records.lock() = records;
        log
    }

    /// Files and records replayed through the hooks on `load`.
    pub(crate) fn with_backlog(files: Vec<LoadedFile>, records: Vec<LogEvent>) -> Self {
        let log = Self::default();
        *log.files.lock() = files;
        *log.backlog.lock() = records;
        log
    }

    /// Import a record without notifying anyone.
    pub(crate) fn push(&self, record: LogEvent) {
        self.records.lock().push(record);
    }

    /// Import a record and notify `hooks`, as a tail would.
    pub(crate) fn append(&self, record: LogEvent, hooks: &dyn IngestHooks) {
        self.push(record.clone());
        hooks.on_record_parsed(&record);
    }

    /// Import a record through the hooks registered by `watch`.
    pub(crate) fn tail(&self, record: LogEvent) {
        let hooks = self.watcher.lock().clone();
        match hooks {
            Some(hooks) => self.append(record, hooks.as_ref()),
            None => self.push(record),
        }
    }
}

impl LogQuery for FakeLog {
    fn latest(&self, event_name: &str) -> Option<LogEvent> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|e| e.event == event_name)
            .cloned()
    }

    fn from_timestamp(&self, since: DateTime<Utc>) -> Vec<LogEvent> {
        self.records
            .lock()
            .iter()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect()
    }

    fn newest(&self, count: usize) -> Vec<LogEvent> {
        self.records.lock().iter().rev().take(count).cloned().collect()
    }

    fn stats(&self) -> LogSourceStats {
        let records = self.records.lock();
        LogSourceStats {
            events_imported: u64::try_from(records.len()).unwrap_or(u64::MAX),
            last_activity: records.iter().map(|e| e.timestamp).max(),
        }
    }
}

#[async_trait]
impl LogSource for FakeLog {
    async fn load(&self, window_days: u32, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_window.lock() = Some(window_days);
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SourceError::Watch("journal directory missing".to_owned()));
        }
        let files = self.files.lock().clone();
        for file in &files {
            hooks.on_file_loaded(file);
        }
        let backlog = std::mem::take(&mut *self.backlog.lock());
        for record in backlog {
            self.append(record, hooks.as_ref());
        }
        Ok(())
    }

    fn watch(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        self.watches.fetch_add(1, Ordering::SeqCst);
        *self.watcher.lock() = Some(hooks);
        Ok(())
    }
}

/// Snapshot source reporting a fixed file list.
#[derive(Default)]
pub(crate) struct FakeSnapshot {
    pub(crate) files: Vec<LoadedFile>,
    pub(crate) loads: AtomicUsize,
    pub(crate) fail_load: AtomicBool,
}

#[async_trait]
impl SnapshotSource for FakeSnapshot {
    async fn load(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SourceError::Watch("snapshot directory missing".to_owned()));
        }
        for file in &self.files {
            hooks.on_file_loaded(file);
        }
        Ok(())
    }

    fn watch(&self, _hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Catalog returning one body and one station per system.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub(crate) body_calls: AtomicUsize,
    pub(crate) station_calls: AtomicUsize,
    pub(crate) fail: AtomicBool,
}

impl FakeCatalog {
    fn check(&self) -> Result<(), CatalogError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CatalogError::Status {
                status: 503,
                body: "unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn bodies(&self, system_name: &str) -> Result<Vec<Body>, CatalogError> {
        self.body_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(vec![Body {
            name: format!("{system_name} A"),
            kind: Some("Star".to_owned()),
            ..Body::default()
        }])
    }

    async fn stations(&self, system_name: &str) -> Result<Vec<Station>, CatalogError> {
        self.station_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(vec![Station {
            name: format!("{system_name} Port"),
            ..Station::default()
        }])
    }
}

/// Sink that keeps every envelope.
#[derive(Default)]
pub(crate) struct RecordingSink {
    sent: Mutex<Vec<BroadcastEnvelope>>,
}

impl RecordingSink {
    /// Everything emitted so far.
    pub(crate) fn sent(&self) -> Vec<BroadcastEnvelope> {
        self.sent.lock().clone()
    }

    /// Number of envelopes on `name`.
    pub(crate) fn count(&self, name: &str) -> usize {
        self.sent.lock().iter().filter(|e| e.name == name).count()
    }

    /// Poll until at least `n` envelopes on `name` arrived, or one second
    /// passed.
    pub(crate) async fn wait_for(&self, name: &str, n: usize) -> usize {
        for _ in 0..1_000 {
            if self.count(name) >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        self.count(name)
    }
}

impl BroadcastSink for RecordingSink {
    fn emit(&self, name: &str, message: serde_json::Value) {
        self.sent.lock().push(BroadcastEnvelope {
            name: name.to_owned(),
            message,
        });
    }
}
