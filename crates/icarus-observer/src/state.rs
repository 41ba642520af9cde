//! Shared application state for the observer server.
//!
//! [`BroadcastChannel`] is the engine's [`BroadcastSink`]: every envelope
//! the engine emits is fanned out to all connected `WebSocket` clients
//! through a [`tokio::sync::broadcast`] channel. [`AppState`] pairs that
//! channel with the engine the REST handlers call into.

use std::sync::Arc;

use icarus_core::{BroadcastSink, Engine};
use icarus_types::BroadcastEnvelope;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast channel.
///
/// A subscriber that falls behind by more than this many messages receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 1024;

/// Fan-out of engine broadcasts to `WebSocket` subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    tx: broadcast::Sender<BroadcastEnvelope>,
}

impl BroadcastChannel {
    /// Create a channel with the default capacity.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every envelope published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEnvelope> {
        self.tx.subscribe()
    }

    /// Number of connected subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an envelope to all subscribers.
    ///
    /// Returns the number of receivers that got it; 0 when nobody is
    /// connected, which is not an error.
    pub fn publish(&self, envelope: BroadcastEnvelope) -> usize {
        self.tx.send(envelope).unwrap_or(0)
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastSink for BroadcastChannel {
    fn emit(&self, name: &str, message: Value) {
        let delivered = self.publish(BroadcastEnvelope {
            name: name.to_owned(),
            message,
        });
        trace!(channel = name, delivered, "Broadcast");
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The engine behind the REST endpoints.
    pub engine: Arc<Engine>,
    /// The channel the engine broadcasts on.
    pub channel: Arc<BroadcastChannel>,
}

impl AppState {
    /// Pair an engine with the channel it was built to emit on.
    pub const fn new(engine: Arc<Engine>, channel: Arc<BroadcastChannel>) -> Self {
        Self { engine, channel }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEnvelope> {
        self.channel.subscribe()
    }
}
