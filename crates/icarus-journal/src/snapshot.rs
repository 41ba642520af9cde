//! Bulk JSON snapshot files.
//!
//! Besides the journal, the game keeps a handful of JSON files (`Status.json`,
//! `Cargo.json`, `Market.json`, ...) that it rewrites in place. Only the
//! latest copy of each matters.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use icarus_core::{IngestHooks, SnapshotSource, SourceError};
use icarus_types::LoadedFile;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::scan::{self, FileInfo, Poller};

/// Whether `name` looks like a snapshot file.
pub fn is_snapshot_file(name: &str) -> bool {
    name.ends_with(".json")
}

/// Which kind of pass is reading the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Startup load; an unreadable file fails it.
    Load,
    /// Background re-scan; an unreadable file is retried next time.
    Rescan,
}

impl Pass {
    fn read_failed(self, file: &FileInfo, source: std::io::Error) -> Result<(), SourceError> {
        match self {
            Self::Load => Err(SourceError::Io {
                path: file.path.clone(),
                source,
            }),
            Self::Rescan => {
                warn!(file = %file.name, error = %source, "Failed to read snapshot file");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Default)]
struct SnapshotState {
    documents: HashMap<String, Value>,
    modified: HashMap<String, SystemTime>,
}

#[derive(Debug)]
struct Inner {
    dir: PathBuf,
    state: Mutex<SnapshotState>,
}

/// Snapshot source backed by the `*.json` files of a directory.
#[derive(Debug)]
pub struct SnapshotFiles {
    inner: Arc<Inner>,
    poll_interval: Duration,
    poller: Poller,
}

impl SnapshotFiles {
    /// A reader over `dir`, re-scanning every `poll_interval` once watched.
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir: dir.into(),
                state: Mutex::new(SnapshotState::default()),
            }),
            poll_interval,
            poller: Poller::default(),
        }
    }

    /// Latest parsed copy of the file called `name`.
    pub fn document(&self, name: &str) -> Option<Value> {
        self.inner.state.lock().documents.get(name).cloned()
    }

    /// Names of every file read so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.lock().documents.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Inner {
    /// Re-read every snapshot file whose modification time changed.
    ///
    /// Returns the number of files read.
    async fn sync(&self, pass: Pass, hooks: &dyn IngestHooks) -> Result<usize, SourceError> {
        let files = scan::list_files(&self.dir, is_snapshot_file).await?;

        let mut read: usize = 0;
        for file in files {
            if self.state.lock().modified.get(&file.name) == Some(&file.modified) {
                continue;
            }
            let data = match tokio::fs::read(&file.path).await {
                Ok(data) => data,
                Err(e) => {
                    pass.read_failed(&file, e)?;
                    continue;
                }
            };
            // The game rewrites these in place; a torn read is retried on the
            // next pass.
            let document = match serde_json::from_slice::<Value>(&data) {
                Ok(document) => document,
                Err(e) => {
                    debug!(file = %file.name, error = %e, "Snapshot file not valid JSON yet");
                    continue;
                }
            };

            {
                let mut state = self.state.lock();
                state.documents.insert(file.name.clone(), document);
                state.modified.insert(file.name.clone(), file.modified);
            }
            hooks.on_file_loaded(&LoadedFile {
                name: file.name,
                size_bytes: u64::try_from(data.len()).unwrap_or(u64::MAX),
                line_count: None,
            });
            read = read.saturating_add(1);
        }
        Ok(read)
    }
}

#[async_trait]
impl SnapshotSource for SnapshotFiles {
    async fn load(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        let read = self.inner.sync(Pass::Load, hooks.as_ref()).await?;
        info!(dir = %self.inner.dir.display(), files = read, "Snapshot files loaded");
        Ok(())
    }

    fn watch(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        let inner = Arc::clone(&self.inner);
        let started = self.poller.start(self.poll_interval, move || {
            let inner = Arc::clone(&inner);
            let hooks = Arc::clone(&hooks);
            async move {
                if let Err(e) = inner.sync(Pass::Rescan, hooks.as_ref()).await {
                    warn!(error = %e, "Snapshot re-scan failed");
                }
            }
        })?;
        if started {
            debug!(dir = %self.inner.dir.display(), "Watching snapshot files");
        }
        Ok(())
    }
}
