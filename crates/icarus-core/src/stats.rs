//! Running ingestion counters.
//!
//! Pure aggregation: the ingestion bridge writes, everyone else reads a
//! [`LoadingStats`] snapshot. Counters sit behind a [`Mutex`] because sources
//! invoke hooks from their own tasks.

use std::collections::{BTreeMap, HashSet};

use icarus_types::{LoadedFile, LoadingStats};
use parking_lot::Mutex;

use crate::loading::PhaseClock;
use crate::source::LogSourceStats;

#[derive(Debug, Default)]
struct Counters {
    files: HashSet<String>,
    log_lines: u64,
    log_bytes: u64,
    event_types: BTreeMap<String, u64>,
    events_imported: u64,
}

/// Accumulates file, line, byte, and per-event-type counts.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    counters: Mutex<Counters>,
}

impl StatsAccumulator {
    /// Create an accumulator with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file the first time its name is seen.
    ///
    /// Returns `false` (and changes nothing) for a name already recorded.
    pub fn record_file(&self, file: &LoadedFile) -> bool {
        let mut counters = self.counters.lock();
        if !counters.files.insert(file.name.clone()) {
            return false;
        }
        counters.log_bytes = counters.log_bytes.saturating_add(file.size_bytes);
        if let Some(lines) = file.line_count {
            counters.log_lines = counters.log_lines.saturating_add(lines);
        }
        true
    }

    /// Mirror the source's own distinct-record count.
    pub fn set_events_imported(&self, count: u64) {
        self.counters.lock().events_imported = count;
    }

    /// Count one occurrence of an event name.
    pub fn count_event_type(&self, event_name: &str) {
        let mut counters = self.counters.lock();
        let count = counters
            .event_types
            .entry(event_name.to_owned())
            .or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Merge the counters with phase timing and source activity.
    pub fn snapshot(&self, phase: &PhaseClock, log: LogSourceStats) -> LoadingStats {
        let counters = self.counters.lock();
        LoadingStats {
            phase: phase.phase(),
            files_loaded_count: u64::try_from(counters.files.len()).unwrap_or(u64::MAX),
            events_imported_count: counters.events_imported,
            log_lines_count: counters.log_lines,
            log_size_bytes: counters.log_bytes,
            event_type_counts: counters.event_types.clone(),
            last_activity_time: log.last_activity,
            elapsed_loading_ms: phase.elapsed_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use icarus_types::LoadingPhase;

    use super::*;

    fn file(name: &str, size_bytes: u64, line_count: Option<u64>) -> LoadedFile {
        LoadedFile {
            name: name.to_owned(),
            size_bytes,
            line_count,
        }
    }

    #[test]
    fn zeroed_before_anything_happens() {
        let stats = StatsAccumulator::new();
        let snap = stats.snapshot(&PhaseClock::new(), LogSourceStats::default());

        assert_eq!(snap.phase, LoadingPhase::NotStarted);
        assert_eq!(snap.files_loaded_count, 0);
        assert_eq!(snap.log_size_bytes, 0);
        assert_eq!(snap.elapsed_loading_ms, 0);
        assert!(snap.last_activity_time.is_none());
    }

    #[test]
    fn duplicate_file_names_are_counted_once() {
        let stats = StatsAccumulator::new();
        assert!(stats.record_file(&file("Journal.01.log", 1_000, Some(10))));
        assert!(!stats.record_file(&file("Journal.01.log", 5_000, Some(50))));
        assert!(stats.record_file(&file("Status.json", 300, None)));

        let snap = stats.snapshot(&PhaseClock::new(), LogSourceStats::default());
        assert_eq!(snap.files_loaded_count, 2);
        assert_eq!(snap.log_size_bytes, 1_300);
        assert_eq!(snap.log_lines_count, 10);
    }

    #[test]
    fn event_types_accumulate() {
        let stats = StatsAccumulator::new();
        stats.count_event_type("Scan");
        stats.count_event_type("Scan");
        stats.count_event_type("Music");
        stats.set_events_imported(3);

        let snap = stats.snapshot(&PhaseClock::new(), LogSourceStats::default());
        assert_eq!(snap.event_type_counts.get("Scan"), Some(&2));
        assert_eq!(snap.event_type_counts.get("Music"), Some(&1));
        assert_eq!(snap.events_imported_count, 3);
    }
}
