//! Outbound broadcast contract and channel names.

use serde::Serialize;
use tracing::warn;

/// Channel carrying every raw journal record once live.
pub const NEW_LOG_ENTRY: &str = "newLogEntry";

/// Channel carrying [`LoadingStats`](icarus_types::LoadingStats) while and
/// after loading.
pub const LOADING_PROGRESS: &str = "loadingProgress";

/// Fire-and-forget push to all subscribers.
///
/// There is no acknowledgement; a sink with no subscribers drops messages.
pub trait BroadcastSink: Send + Sync {
    /// Push `message` on channel `name`.
    fn emit(&self, name: &str, message: serde_json::Value);
}

/// Serialize `payload` and emit it, logging (not propagating) failures.
pub fn emit_json<T: Serialize + ?Sized>(sink: &dyn BroadcastSink, name: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(message) => sink.emit(name, message),
        Err(e) => warn!(channel = name, error = %e, "Failed to serialize broadcast payload"),
    }
}
