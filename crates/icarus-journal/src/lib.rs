//! File-backed record sources for the ICARUS journal service.
//!
//! - [`JournalLog`] replays and tails `Journal.*.log`
//! - [`SnapshotFiles`] reads the JSON status files the game rewrites in place
//!
//! Both poll the directory on a fixed period once watched.

pub mod log;
mod scan;
pub mod snapshot;

pub use log::JournalLog;
pub use snapshot::SnapshotFiles;
