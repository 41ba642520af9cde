//! Observer API server for the ICARUS journal service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every engine
//!   broadcast via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the engine's request surface (host info,
//!   loading stats, commander, log entries, system info, start)
//!
//! # Architecture
//!
//! [`BroadcastChannel`] is handed to the engine as its broadcast sink, and
//! [`AppState`] holds that channel together with the engine. REST reads go
//! straight to the engine; `WebSocket` clients each hold a channel receiver
//! with automatic lag handling.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerError, serve, spawn_observer, start_server};
pub use state::{AppState, BroadcastChannel};
