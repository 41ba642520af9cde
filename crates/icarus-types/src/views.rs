//! Small response and broadcast payloads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::known::Known;

/// Commander identity from the latest `LoadGame` record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Commander {
    /// Commander name.
    #[ts(type = "string")]
    pub commander: Known<String>,
    /// Credit balance at load time.
    #[ts(type = "number | string")]
    pub credits: Known<u64>,
}

/// Base URLs on which the service is reachable from the local network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HostInfo {
    /// One `http://{ip}:{port}` entry per non-loopback IPv4 interface.
    pub urls: Vec<String>,
}

/// A single message pushed to subscribers.
///
/// `name` is the channel (`newLogEntry`, `loadingProgress`, or a derived
/// event name) and `message` the JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BroadcastEnvelope {
    /// Channel name.
    pub name: String,
    /// Payload.
    pub message: serde_json::Value,
}
