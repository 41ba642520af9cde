//! The engine context.
//!
//! [`Engine`] owns every piece of shared state: the phase clock, the
//! counters, the derived-event registry, and the system cache. The HTTP
//! layer holds one `Arc<Engine>` and calls the operations below.

use std::sync::Arc;
use std::time::Duration;

use icarus_types::{Commander, HostInfo, LoadingStats, LogEvent, SystemInfo};
use tracing::{error, info};

use crate::broadcast::BroadcastSink;
use crate::catalog::{Catalog, CatalogError};
use crate::config::ServiceConfig;
use crate::derived::{DerivedEventRegistry, Dispatcher, ResolveContext};
use crate::ingest::IngestBridge;
use crate::loading::{PhaseClock, ProgressReporter, ProgressTicker};
use crate::queries::{self, LogEntriesQuery};
use crate::source::{IngestHooks, LogSource, SnapshotSource, SourceError};
use crate::stats::StatsAccumulator;
use crate::system::SystemResolver;

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A record source failed while loading or starting its watcher.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The star-system catalog failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// The adapters the engine reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    /// Bulk JSON snapshot files.
    pub snapshot: Arc<dyn SnapshotSource>,
    /// The appended journal.
    pub log: Arc<dyn LogSource>,
    /// External star-system catalog.
    pub catalog: Arc<dyn Catalog>,
    /// Outbound broadcast channel.
    pub sink: Arc<dyn BroadcastSink>,
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Port reported by [`Engine::host_info`].
    pub port: u16,
    /// Period of `loadingProgress` broadcasts while loading.
    pub progress_interval: Duration,
    /// Default journal replay window.
    pub history_window_days: u32,
}

impl EngineSettings {
    /// Take the engine-relevant values from the service config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            port: config.server.port,
            progress_interval: config.loading.progress_interval(),
            history_window_days: config.journal.history_window_days,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

/// Options for [`Engine::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Replay window in days; the configured window when `None`.
    pub history_window_days: Option<u32>,
}

/// Journal ingestion engine.
pub struct Engine {
    snapshot: Arc<dyn SnapshotSource>,
    log: Arc<dyn LogSource>,
    settings: EngineSettings,
    phase: Arc<PhaseClock>,
    reporter: ProgressReporter,
    hooks: Arc<IngestBridge>,
    systems: SystemResolver,
}

impl Engine {
    /// Build an engine with the built-in derived events.
    pub fn new(collaborators: Collaborators, settings: EngineSettings) -> Self {
        Self::with_registry(collaborators, settings, DerivedEventRegistry::standard())
    }

    /// Build an engine with a custom derived-event registry.
    pub fn with_registry(
        collaborators: Collaborators,
        settings: EngineSettings,
        registry: DerivedEventRegistry,
    ) -> Self {
        let Collaborators {
            snapshot,
            log,
            catalog,
            sink,
        } = collaborators;

        let stats = Arc::new(StatsAccumulator::new());
        let phase = Arc::new(PhaseClock::new());
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            ResolveContext {
                log: Arc::clone(&log),
            },
            Arc::clone(&sink),
        );
        let hooks = Arc::new(IngestBridge::new(
            Arc::clone(&stats),
            Arc::clone(&phase),
            dispatcher,
            Arc::clone(&log),
            Arc::clone(&sink),
        ));
        let reporter = ProgressReporter::new(stats, Arc::clone(&phase), Arc::clone(&log), sink);

        Self {
            snapshot,
            log,
            settings,
            phase,
            reporter,
            hooks,
            systems: SystemResolver::new(catalog),
        }
    }

    /// URLs on which this service is reachable from the local network.
    pub fn host_info(&self) -> HostInfo {
        queries::host_info(self.settings.port)
    }

    /// Current loading statistics.
    pub fn loading_stats(&self) -> LoadingStats {
        self.reporter.snapshot()
    }

    /// Commander name and credits.
    pub fn commander(&self) -> Commander {
        queries::commander(self.log.as_ref())
    }

    /// Journal records by count or since a timestamp.
    pub fn log_entries(&self, query: &LogEntriesQuery) -> Vec<LogEvent> {
        queries::log_entries(self.log.as_ref(), query)
    }

    /// Describe a system, or the current one when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the catalog fetch fails.
    pub async fn system(&self, name: Option<&str>) -> Result<Option<SystemInfo>, EngineError> {
        Ok(self.systems.resolve(self.log.as_ref(), name).await?)
    }

    /// Run the initial load, then start the watchers.
    ///
    /// Only the first call does any work. Later calls, including calls made
    /// while the first is still running, return the current statistics
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Source`] if a source fails to load or watch.
    /// The phase then stays `InProgress` and the progress ticker is stopped.
    pub async fn start(&self, options: StartOptions) -> Result<LoadingStats, EngineError> {
        if !self.phase.try_begin() {
            info!(phase = ?self.phase.phase(), "Loading already started");
            return Ok(self.reporter.snapshot());
        }

        let window_days = options
            .history_window_days
            .unwrap_or(self.settings.history_window_days);
        info!(window_days, "Initial load started");

        self.reporter.emit();
        let ticker = ProgressTicker::spawn(self.settings.progress_interval, self.reporter.clone());

        if let Err(e) = self.ingest(window_days).await {
            ticker.stop();
            error!(error = %e, "Initial load failed");
            return Err(e.into());
        }

        self.phase.finish();
        ticker.stop();
        let stats = self.reporter.emit();
        info!(
            files = stats.files_loaded_count,
            events = stats.events_imported_count,
            elapsed_ms = stats.elapsed_loading_ms,
            "Initial load complete"
        );
        Ok(stats)
    }

    async fn ingest(&self, window_days: u32) -> Result<(), SourceError> {
        let hooks: Arc<dyn IngestHooks> = Arc::clone(&self.hooks) as Arc<dyn IngestHooks>;

        self.snapshot.load(Arc::clone(&hooks)).await?;
        self.snapshot.watch(Arc::clone(&hooks))?;

        self.log.load(window_days, Arc::clone(&hooks)).await?;
        self.log.watch(hooks)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Utc;
    use icarus_types::{LoadedFile, LoadingPhase};
    use serde_json::json;

    use super::*;
    use crate::broadcast::{LOADING_PROGRESS, NEW_LOG_ENTRY};
    use crate::testing::{FakeCatalog, FakeLog, FakeSnapshot, RecordingSink};

    struct Fixture {
        engine: Arc<Engine>,
        log: Arc<FakeLog>,
        snapshot: Arc<FakeSnapshot>,
        catalog: Arc<FakeCatalog>,
        sink: Arc<RecordingSink>,
    }

    fn fixture(log: FakeLog) -> Fixture {
        let log = Arc::new(log);
        let snapshot = Arc::new(FakeSnapshot {
            files: vec![LoadedFile {
                name: "Status.json".to_owned(),
                size_bytes: 512,
                line_count: None,
            }],
            ..FakeSnapshot::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let catalog = Arc::new(FakeCatalog::default());
        let engine = Engine::new(
            Collaborators {
                snapshot: Arc::clone(&snapshot) as Arc<dyn SnapshotSource>,
                log: Arc::clone(&log) as Arc<dyn LogSource>,
                catalog: Arc::clone(&catalog) as Arc<dyn Catalog>,
                sink: Arc::clone(&sink) as Arc<dyn BroadcastSink>,
            },
            EngineSettings {
                port: 3300,
                progress_interval: Duration::from_secs(60),
                history_window_days: 30,
            },
        );
        Fixture {
            engine: Arc::new(engine),
            log,
            snapshot,
            catalog,
            sink,
        }
    }

    fn journal_file(name: &str, size_bytes: u64, lines: u64) -> LoadedFile {
        LoadedFile {
            name: name.to_owned(),
            size_bytes,
            line_count: Some(lines),
        }
    }

    #[tokio::test]
    async fn start_loads_once() {
        let f = fixture(FakeLog::with_backlog(
            vec![journal_file("Journal.01.log", 1_000, 2)],
            vec![
                LogEvent::new("Fileheader", Utc::now()),
                LogEvent::new("Music", Utc::now()),
            ],
        ));

        let first = f.engine.start(StartOptions::default()).await.unwrap();
        let second = f.engine.start(StartOptions::default()).await.unwrap();

        assert_eq!(first.phase, LoadingPhase::Complete);
        assert_eq!(second.phase, LoadingPhase::Complete);
        assert_eq!(second.files_loaded_count, 2);
        assert_eq!(f.log.loads.load(Ordering::SeqCst), 1);
        assert_eq!(f.log.watches.load(Ordering::SeqCst), 1);
        assert_eq!(f.snapshot.loads.load(Ordering::SeqCst), 1);
        assert_eq!(*f.log.last_window.lock(), Some(30));
    }

    #[tokio::test]
    async fn concurrent_starts_run_one_load() {
        let f = fixture(FakeLog::default());

        let (a, b) = tokio::join!(
            f.engine.start(StartOptions::default()),
            f.engine.start(StartOptions::default())
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(f.log.loads.load(Ordering::SeqCst), 1);
        assert_eq!(f.engine.loading_stats().phase, LoadingPhase::Complete);
    }

    #[tokio::test]
    async fn window_override_reaches_the_source() {
        let f = fixture(FakeLog::default());
        f.engine
            .start(StartOptions {
                history_window_days: Some(3),
            })
            .await
            .unwrap();
        assert_eq!(*f.log.last_window.lock(), Some(3));
    }

    #[tokio::test]
    async fn failed_load_propagates_and_stays_in_progress() {
        let f = fixture(FakeLog::default());
        f.log.fail_load.store(true, Ordering::SeqCst);

        let result = f.engine.start(StartOptions::default()).await;
        assert!(matches!(result, Err(EngineError::Source(_))));
        assert_eq!(f.engine.loading_stats().phase, LoadingPhase::InProgress);
        assert_eq!(f.log.watches.load(Ordering::SeqCst), 0);

        let again = f.engine.start(StartOptions::default()).await.unwrap();
        assert_eq!(again.phase, LoadingPhase::InProgress);
        assert_eq!(f.log.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backlog_is_silent_then_tail_is_live() {
        let backlog: Vec<LogEvent> = (0..1_000_u64)
            .map(|i| {
                if i == 500 {
                    LogEvent::new("LoadGame", Utc::now()).with_field("Commander", "Jameson")
                } else {
                    LogEvent::new("Scan", Utc::now()).with_field("BodyID", i)
                }
            })
            .collect();
        let f = fixture(FakeLog::with_backlog(
            vec![journal_file("Journal.01.log", 250_000, 1_000)],
            backlog,
        ));

        let stats = f.engine.start(StartOptions::default()).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(stats.events_imported_count, 1_000);
        assert_eq!(stats.event_type_counts.get("Scan"), Some(&999));
        let names: Vec<String> = f.sink.sent().into_iter().map(|e| e.name).collect();
        assert!(names.iter().all(|n| n == LOADING_PROGRESS));
        assert!(names.len() >= 2);

        let last = f.sink.sent().last().map(|e| e.message["phase"].clone());
        assert_eq!(last, Some(json!("complete")));

        f.log.tail(
            LogEvent::new("FSDJump", Utc::now())
                .with_field("StarSystem", "Sol")
                .with_field("Body", "Sol"),
        );
        assert_eq!(f.sink.count(NEW_LOG_ENTRY), 1);
        let live = f.engine.loading_stats();
        assert_eq!(live.events_imported_count, 1_001);
        assert_eq!(live.event_type_counts.get("FSDJump"), Some(&1));
    }

    #[tokio::test]
    async fn live_load_game_reaches_subscribers() {
        let f = fixture(FakeLog::default());
        f.engine.start(StartOptions::default()).await.unwrap();

        f.log.tail(
            LogEvent::new("LoadGame", Utc::now())
                .with_field("Commander", "Jameson")
                .with_field("Credits", 1_000),
        );

        assert_eq!(f.sink.wait_for("GameLoadedEvent", 1).await, 1);
        let sent = f.sink.sent();
        let game_loaded = sent.iter().find(|e| e.name == "GameLoadedEvent").unwrap();
        assert_eq!(
            game_loaded.message,
            json!({"commander": "Jameson", "credits": 1_000})
        );
        assert_eq!(f.engine.commander().commander.value(), Some(&"Jameson".to_owned()));
    }

    #[tokio::test]
    async fn current_system_follows_the_journal() {
        let f = fixture(FakeLog::default());
        assert!(f.engine.system(None).await.unwrap().is_none());

        f.log.push(
            LogEvent::new("FSDJump", Utc::now())
                .with_field("StarSystem", "Sol")
                .with_field("Population", 22_780_919_531_u64),
        );
        let info = f.engine.system(None).await.unwrap().unwrap();
        assert_eq!(info.name, "Sol");
        assert_eq!(info.live.population.value(), Some(&22_780_919_531));
    }

    #[tokio::test]
    async fn commander_and_system_from_one_session() {
        let f = fixture(FakeLog::with_records(vec![
            LogEvent::new("LoadGame", Utc::now())
                .with_field("Commander", "Jameson")
                .with_field("Credits", 5_000),
            LogEvent::new("FSDJump", Utc::now())
                .with_field("StarSystem", "Sol")
                .with_field("SystemAllegiance", "Federation"),
        ]));

        let cmdr = f.engine.commander();
        assert_eq!(cmdr.commander.value(), Some(&"Jameson".to_owned()));
        assert_eq!(cmdr.credits.value(), Some(&5_000));

        let current = f.engine.system(None).await.unwrap().unwrap();
        assert_eq!(current.name, "Sol");
        assert_eq!(current.live.allegiance.value(), Some(&"Federation".to_owned()));

        f.catalog.fail.store(true, Ordering::SeqCst);
        let named = f.engine.system(Some("Sol")).await.unwrap().unwrap();
        assert_eq!(named.bodies, current.bodies);
        assert_eq!(named.stations, current.stations);
        assert_eq!(f.catalog.body_calls.load(Ordering::SeqCst), 1);
    }
}
