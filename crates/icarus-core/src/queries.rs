//! Read-only helpers over the journal source.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use icarus_types::{Commander, HostInfo, LogEvent};
use serde::Deserialize;
use tracing::warn;

use crate::source::LogQuery;

/// Number of entries returned by [`log_entries`] when no count is given.
pub const DEFAULT_LOG_ENTRY_COUNT: usize = 100;

/// Parameters for [`log_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogEntriesQuery {
    /// Newest N records (default 100). Ignored when `timestamp` is set.
    pub count: Option<usize>,
    /// Return every record at or after this instant instead.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Reachable base URLs for every non-loopback IPv4 interface.
pub fn host_info(port: u16) -> HostInfo {
    let addrs = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip())
            .collect(),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate network interfaces");
            Vec::new()
        }
    };
    HostInfo {
        urls: reachable_urls(addrs, port),
    }
}

/// Format `http://{ip}:{port}` for each non-loopback IPv4 address.
pub fn reachable_urls(addrs: impl IntoIterator<Item = IpAddr>, port: u16) -> Vec<String> {
    addrs
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(format!("http://{v4}:{port}")),
            _ => None,
        })
        .collect()
}

/// Commander name and credits from the latest `LoadGame`.
pub fn commander(log: &dyn LogQuery) -> Commander {
    let load_game = log.latest("LoadGame");
    Commander {
        commander: load_game
            .as_ref()
            .and_then(|e| e.str_field("Commander"))
            .map(ToOwned::to_owned)
            .into(),
        credits: load_game.as_ref().and_then(|e| e.u64_field("Credits")).into(),
    }
}

/// Records since `query.timestamp`, or the newest `query.count`.
pub fn log_entries(log: &dyn LogQuery, query: &LogEntriesQuery) -> Vec<LogEvent> {
    query.timestamp.map_or_else(
        || log.newest(query.count.unwrap_or(DEFAULT_LOG_ENTRY_COUNT)),
        |since| log.from_timestamp(since),
    )
}
