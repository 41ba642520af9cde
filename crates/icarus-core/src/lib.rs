//! Ingestion engine for the ICARUS journal service.
//!
//! Reads game journal records through pluggable sources, tracks loading
//! progress, fans raw events out to derived notifications, and caches
//! star-system catalog data. The HTTP and WebSocket surfaces live in
//! `icarus-observer`; this crate has no I/O of its own beyond what its
//! collaborators do.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration and environment overrides
//! - [`source`] -- Record source contracts and ingestion hooks
//! - [`catalog`] -- Star-system catalog contract
//! - [`broadcast`] -- Outbound broadcast contract
//! - [`stats`] -- Running ingestion counters
//! - [`loading`] -- Loading phase clock and progress ticker
//! - [`derived`] -- Derived-event registry and dispatcher
//! - [`ingest`] -- Bridge from source hooks to stats and broadcasts
//! - [`queries`] -- Read-only helpers (commander, log entries, host info)
//! - [`system`] -- System resolver and catalog cache
//! - [`engine`] -- The engine context tying it all together

pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod derived;
pub mod engine;
pub mod ingest;
pub mod loading;
pub mod queries;
pub mod source;
pub mod stats;
pub mod system;

#[cfg(test)]
mod testing;

pub use broadcast::{BroadcastSink, LOADING_PROGRESS, NEW_LOG_ENTRY};
pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, ServiceConfig};
pub use derived::{DerivedEventDefinition, DerivedEventRegistry, DispatchError};
pub use engine::{Collaborators, Engine, EngineError, EngineSettings, StartOptions};
pub use queries::LogEntriesQuery;
pub use source::{IngestHooks, LogQuery, LogSource, LogSourceStats, SnapshotSource, SourceError};
