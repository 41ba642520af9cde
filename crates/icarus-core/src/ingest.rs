//! Ingestion callback bridge.
//!
//! [`IngestBridge`] is the [`IngestHooks`] implementation handed to both
//! record sources. Per record, counters are updated first; only then is the
//! dispatch/broadcast decision taken, and only outside the bulk-load phase.

use std::sync::Arc;

use icarus_types::{LoadedFile, LogEvent};
use tracing::{debug, trace};

use crate::broadcast::{BroadcastSink, NEW_LOG_ENTRY, emit_json};
use crate::derived::Dispatcher;
use crate::loading::PhaseClock;
use crate::source::{IngestHooks, LogSource};
use crate::stats::StatsAccumulator;

/// Routes files and records from the sources into stats and broadcasts.
pub struct IngestBridge {
    stats: Arc<StatsAccumulator>,
    phase: Arc<PhaseClock>,
    dispatcher: Dispatcher,
    log: Arc<dyn LogSource>,
    sink: Arc<dyn BroadcastSink>,
}

impl IngestBridge {
    /// Wire the bridge to the shared counters, phase, and dispatcher.
    pub fn new(
        stats: Arc<StatsAccumulator>,
        phase: Arc<PhaseClock>,
        dispatcher: Dispatcher,
        log: Arc<dyn LogSource>,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            stats,
            phase,
            dispatcher,
            log,
            sink,
        }
    }
}

impl IngestHooks for IngestBridge {
    fn on_file_loaded(&self, file: &LoadedFile) {
        if self.stats.record_file(file) {
            debug!(
                file = %file.name,
                size_bytes = file.size_bytes,
                lines = ?file.line_count,
                "File loaded"
            );
        }
    }

    fn on_record_parsed(&self, record: &LogEvent) {
        self.stats
            .set_events_imported(self.log.stats().events_imported);

        let live = !self.phase.is_suppressing();
        if self.dispatcher.registry().is_trigger(&record.event) {
            if live {
                let launched = self.dispatcher.dispatch(&record.event);
                trace!(event = %record.event, launched, "Derived events dispatched");
            }
        } else {
            self.stats.count_event_type(&record.event);
        }

        if live {
            emit_json(self.sink.as_ref(), NEW_LOG_ENTRY, record);
        }
    }
}
