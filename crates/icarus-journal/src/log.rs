//! Line-oriented journal reader.
//!
//! The game writes one JSON object per line to `Journal.<stamp>.log` and
//! starts a new file every session. [`JournalLog`] replays the files inside
//! the history window, then tails them: each pass reads a file from the byte
//! offset where the previous pass stopped. A trailing line that does not yet
//! parse is left for the next pass, since the game may be mid-write.
//!
//! Records are deduplicated by their raw line text.

use std::collections::{HashMap, HashSet};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use icarus_core::{IngestHooks, LogQuery, LogSource, LogSourceStats, SourceError};
use icarus_types::{LoadedFile, LogEvent};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use crate::scan::{self, FileInfo, Poller};

const SECONDS_PER_DAY: u64 = 86_400;

/// Whether `name` looks like a journal file.
pub fn is_journal_file(name: &str) -> bool {
    name.starts_with("Journal.") && name.ends_with(".log")
}

#[derive(Debug, Default)]
struct LogState {
    /// Imported records, ordered by timestamp.
    records: Vec<LogEvent>,
    seen: HashSet<String>,
    progress: HashMap<String, FileProgress>,
    /// Files modified before this are ignored.
    cutoff: Option<SystemTime>,
}

/// How far into one file the reader has got.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FileProgress {
    /// Bytes consumed.
    offset: u64,
    /// Newlines within the consumed bytes.
    newlines: u64,
}

#[derive(Debug)]
struct Inner {
    dir: PathBuf,
    state: Mutex<LogState>,
}

/// Journal source backed by a directory of `Journal.*.log` files.
#[derive(Debug)]
pub struct JournalLog {
    inner: Arc<Inner>,
    poll_interval: Duration,
    poller: Poller,
}

impl JournalLog {
    /// A reader over `dir`, re-scanning every `poll_interval` once watched.
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir: dir.into(),
                state: Mutex::new(LogState::default()),
            }),
            poll_interval,
            poller: Poller::default(),
        }
    }

    /// The watched directory.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

impl Inner {
    /// Read every new byte of every journal file inside the window.
    ///
    /// Returns the number of new records.
    async fn sync(&self, hooks: &dyn IngestHooks) -> Result<usize, SourceError> {
        let cutoff = self.state.lock().cutoff;
        let files = scan::list_files(&self.dir, is_journal_file).await?;

        let mut imported: usize = 0;
        for file in files {
            if cutoff.is_some_and(|c| file.modified < c) {
                continue;
            }
            let known = self.state.lock().progress.get(&file.name).copied();
            if known.is_some_and(|p| p.offset == file.size) {
                continue;
            }
            let mut from = known.unwrap_or_default();
            if from.offset > file.size {
                debug!(file = %file.name, "Journal file shrank, reading from the start");
                from = FileProgress::default();
            }

            let unread = read_from(&file.path, from.offset)
                .await
                .map_err(|source| SourceError::Io {
                    path: file.path.clone(),
                    source,
                })?;
            let (fresh, reached) = self.ingest(&file, from, &unread);

            let unterminated = u64::from(unread.last().is_some_and(|b| *b != b'\n'));
            hooks.on_file_loaded(&LoadedFile {
                name: file.name.clone(),
                size_bytes: file.size.max(from.offset.saturating_add(len_u64(&unread))),
                line_count: Some(reached.newlines.saturating_add(unterminated)),
            });
            for record in &fresh {
                hooks.on_record_parsed(record);
            }
            imported = imported.saturating_add(fresh.len());
        }
        Ok(imported)
    }

    /// Parse `unread`, the bytes of `file` past `from`, and store new records.
    ///
    /// Returns the new records and the progress reached.
    fn ingest(
        &self,
        file: &FileInfo,
        from: FileProgress,
        unread: &[u8],
    ) -> (Vec<LogEvent>, FileProgress) {
        let mut state = self.state.lock();
        let mut consumed: usize = 0;
        let mut fresh = Vec::new();
        for segment in unread.split_inclusive(|b| *b == b'\n') {
            let complete = segment.last() == Some(&b'\n');
            let text = String::from_utf8_lossy(segment);
            let line = text.trim();
            if line.is_empty() {
                consumed = consumed.saturating_add(segment.len());
                continue;
            }
            match serde_json::from_str::<LogEvent>(line) {
                Ok(record) => {
                    consumed = consumed.saturating_add(segment.len());
                    if state.seen.insert(line.to_owned()) {
                        let at = state
                            .records
                            .partition_point(|r| r.timestamp <= record.timestamp);
                        state.records.insert(at, record.clone());
                        fresh.push(record);
                    }
                }
                Err(e) if complete => {
                    consumed = consumed.saturating_add(segment.len());
                    warn!(file = %file.name, error = %e, "Skipping unparseable journal line");
                }
                // Partial trailing line; retry on the next pass.
                Err(_) => break,
            }
        }

        let read = unread.get(..consumed).unwrap_or_default();
        let reached = FileProgress {
            offset: from.offset.saturating_add(len_u64(read)),
            newlines: from.newlines.saturating_add(count_newlines(read)),
        };
        state.progress.insert(file.name.clone(), reached);
        (fresh, reached)
    }
}

/// The bytes of `path` from `offset` to the end.
async fn read_from(path: &Path, offset: u64) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).await?;
    Ok(data)
}

fn count_newlines(data: &[u8]) -> u64 {
    u64::try_from(memchr::memchr_iter(b'\n', data).count()).unwrap_or(u64::MAX)
}

fn len_u64(data: &[u8]) -> u64 {
    u64::try_from(data.len()).unwrap_or(u64::MAX)
}

impl LogQuery for JournalLog {
    fn latest(&self, event_name: &str) -> Option<LogEvent> {
        self.inner
            .state
            .lock()
            .records
            .iter()
            .rev()
            .find(|r| r.event == event_name)
            .cloned()
    }

    fn from_timestamp(&self, since: DateTime<Utc>) -> Vec<LogEvent> {
        let state = self.inner.state.lock();
        let start = state.records.partition_point(|r| r.timestamp < since);
        state.records.get(start..).unwrap_or_default().to_vec()
    }

    fn newest(&self, count: usize) -> Vec<LogEvent> {
        self.inner
            .state
            .lock()
            .records
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect()
    }

    fn stats(&self) -> LogSourceStats {
        let state = self.inner.state.lock();
        LogSourceStats {
            events_imported: u64::try_from(state.records.len()).unwrap_or(u64::MAX),
            last_activity: state.records.last().map(|r| r.timestamp),
        }
    }
}

#[async_trait]
impl LogSource for JournalLog {
    async fn load(&self, window_days: u32, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        let window = Duration::from_secs(u64::from(window_days).saturating_mul(SECONDS_PER_DAY));
        let cutoff = SystemTime::now()
            .checked_sub(window)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.inner.state.lock().cutoff = Some(cutoff);

        let imported = self.inner.sync(hooks.as_ref()).await?;
        info!(
            dir = %self.inner.dir.display(),
            window_days,
            records = imported,
            "Journal history loaded"
        );
        Ok(())
    }

    fn watch(&self, hooks: Arc<dyn IngestHooks>) -> Result<(), SourceError> {
        let inner = Arc::clone(&self.inner);
        let started = self.poller.start(self.poll_interval, move || {
            let inner = Arc::clone(&inner);
            let hooks = Arc::clone(&hooks);
            async move {
                match inner.sync(hooks.as_ref()).await {
                    Ok(0) => {}
                    Ok(n) => debug!(records = n, "Journal tail"),
                    Err(e) => warn!(error = %e, "Journal re-scan failed"),
                }
            }
        })?;
        if started {
            info!(dir = %self.inner.dir.display(), "Watching journal");
        }
        Ok(())
    }
}
