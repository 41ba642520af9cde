//! Loading-phase state machine and progress reporting.
//!
//! ```text
//! NotStarted --begin--> InProgress --finish--> Complete
//! ```
//!
//! [`PhaseClock`] owns the phase and its start/end timestamps. The
//! `NotStarted -> InProgress` transition is a check-and-set so that only one
//! caller ever runs the bulk load. While the phase is `InProgress` the
//! ingestion bridge suppresses every broadcast except progress.
//!
//! [`ProgressTicker`] pushes a `loadingProgress` message on a fixed period
//! until it is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use icarus_types::{LoadingPhase, LoadingStats};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::broadcast::{BroadcastSink, LOADING_PROGRESS, emit_json};
use crate::source::LogSource;
use crate::stats::StatsAccumulator;

#[derive(Debug, Default)]
struct PhaseState {
    phase: LoadingPhase,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

/// Loading phase plus start/end timestamps.
#[derive(Debug, Default)]
pub struct PhaseClock {
    state: Mutex<PhaseState>,
}

impl PhaseClock {
    /// A clock in [`LoadingPhase::NotStarted`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Move from `NotStarted` to `InProgress`, recording the start time.
    ///
    /// Returns `false` without changing anything if loading has already
    /// begun (or finished).
    pub fn try_begin(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase != LoadingPhase::NotStarted {
            return false;
        }
        state.phase = LoadingPhase::InProgress;
        state.started_at = Some(Utc::now());
        true
    }

    /// Move to `Complete`, recording the end time.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.phase = LoadingPhase::Complete;
        state.ended_at = Some(Utc::now());
    }

    /// Current phase.
    pub fn phase(&self) -> LoadingPhase {
        self.state.lock().phase
    }

    /// Whether broadcasts are currently withheld.
    pub fn is_suppressing(&self) -> bool {
        self.phase() == LoadingPhase::InProgress
    }

    /// Milliseconds from start to end, or start to now while in progress.
    pub fn elapsed_ms(&self) -> u64 {
        let state = self.state.lock();
        let Some(started_at) = state.started_at else {
            return 0;
        };
        let until = state.ended_at.unwrap_or_else(Utc::now);
        let elapsed = until.signed_duration_since(started_at).num_milliseconds();
        // Wall clocks can step backwards; treat that as zero.
        u64::try_from(elapsed.max(0)).unwrap_or(0)
    }
}

/// Builds and pushes [`LoadingStats`] snapshots.
#[derive(Clone)]
pub struct ProgressReporter {
    stats: Arc<StatsAccumulator>,
    phase: Arc<PhaseClock>,
    log: Arc<dyn LogSource>,
    sink: Arc<dyn BroadcastSink>,
}

impl ProgressReporter {
    /// Create a reporter over the shared counters.
    pub fn new(
        stats: Arc<StatsAccumulator>,
        phase: Arc<PhaseClock>,
        log: Arc<dyn LogSource>,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            stats,
            phase,
            log,
            sink,
        }
    }

    /// Current statistics snapshot.
    pub fn snapshot(&self) -> LoadingStats {
        self.stats.snapshot(&self.phase, self.log.stats())
    }

    /// Push the current snapshot on `loadingProgress`.
    pub fn emit(&self) -> LoadingStats {
        let stats = self.snapshot();
        emit_json(self.sink.as_ref(), LOADING_PROGRESS, &stats);
        stats
    }
}

/// Shortest accepted progress period.
const MIN_PROGRESS_PERIOD: Duration = Duration::from_millis(10);

/// Periodic `loadingProgress` emitter running on its own task.
///
/// Stopping (or dropping) the ticker aborts the task.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Spawn the ticker. The first periodic emission happens one `period`
    /// from now; callers emit the immediate one themselves.
    pub fn spawn(period: Duration, reporter: ProgressReporter) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(MIN_PROGRESS_PERIOD));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let stats = reporter.emit();
                debug!(
                    files = stats.files_loaded_count,
                    events = stats.events_imported_count,
                    "Loading progress"
                );
            }
        });
        Self { handle }
    }

    /// Stop emitting.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
