//! Directory listing and the background re-scan task shared by both sources.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use icarus_core::SourceError;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest re-scan period accepted.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One regular file found in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Regular files in `dir` whose name passes `keep`, oldest first.
pub(crate) async fn list_files(
    dir: &Path,
    keep: impl Fn(&str) -> bool,
) -> Result<Vec<FileInfo>, SourceError> {
    let io_err = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !keep(&name) {
            continue;
        }
        // Files can vanish between listing and stat.
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(FileInfo {
            path: entry.path(),
            name,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// Owns the re-scan task of one source. Dropping it stops the task.
#[derive(Debug, Default)]
pub(crate) struct Poller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Run `pass` every `period` on the current runtime.
    ///
    /// Returns `Ok(false)` if a task is already running.
    pub fn start<F, Fut>(&self, period: Duration, mut pass: F) -> Result<bool, SourceError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return Ok(false);
        }
        let runtime = Handle::try_current().map_err(|e| SourceError::Watch(e.to_string()))?;

        let period = period.max(MIN_POLL_INTERVAL);
        *handle = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                pass().await;
            }
        }));
        Ok(true)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}
