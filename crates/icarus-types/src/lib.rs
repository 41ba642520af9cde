//! Shared type definitions for the ICARUS journal service.
//!
//! Everything that crosses a crate or process boundary lives here: journal
//! records, loading statistics, system views, and broadcast envelopes.
//! Types flow to `TypeScript` via `ts-rs` for the web client.
//!
//! # Modules
//!
//! - [`known`] -- The `Unknown` sentinel wrapper
//! - [`log`] -- Raw journal records and loaded-file bookkeeping
//! - [`stats`] -- Loading phase and statistics snapshot
//! - [`system`] -- Catalog bodies/stations and the enriched system view
//! - [`views`] -- Commander, host info, broadcast envelope

pub mod known;
pub mod log;
pub mod stats;
pub mod system;
pub mod views;

// Re-export all public types at crate root for convenience.
pub use known::{Known, UNKNOWN_VALUE};
pub use log::{LoadedFile, LogEvent};
pub use stats::{LoadingPhase, LoadingStats};
pub use system::{Body, Economy, FactionRef, LiveSystemFields, Station, SystemInfo};
pub use views::{BroadcastEnvelope, Commander, HostInfo};
