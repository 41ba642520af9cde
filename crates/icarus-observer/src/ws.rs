//! `WebSocket` handler for the broadcast stream.
//!
//! Clients connect to `GET /ws/events` and receive one JSON-encoded
//! [`BroadcastEnvelope`] text frame per broadcast: raw journal records,
//! derived events, and loading progress. `?channels=a,b` limits the stream
//! to the named channels.
//!
//! A client that falls behind skips the messages it lagged on.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use icarus_types::BroadcastEnvelope;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Query parameters for `GET /ws/events`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated channel names; every channel when absent.
    pub channels: Option<String>,
}

/// Which broadcast channels a client wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    only: Option<HashSet<String>>,
}

impl ChannelFilter {
    /// Parse `a,b,c`. Blank or missing means every channel.
    pub fn parse(param: Option<&str>) -> Self {
        let names: HashSet<String> = param
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self {
            only: (!names.is_empty()).then_some(names),
        }
    }

    /// Whether envelopes on `channel` reach this client.
    pub fn allows(&self, channel: &str) -> bool {
        self.only.as_ref().is_none_or(|names| names.contains(channel))
    }
}

/// What to do with one item from the broadcast receiver.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Send(String),
    Skip,
    Close,
}

fn step(filter: &ChannelFilter, received: Result<BroadcastEnvelope, RecvError>) -> Step {
    match received {
        Ok(envelope) if !filter.allows(&envelope.name) => Step::Skip,
        Ok(envelope) => match serde_json::to_string(&envelope) {
            Ok(frame) => Step::Send(frame),
            Err(e) => {
                warn!(channel = %envelope.name, error = %e, "Broadcast not serializable");
                Step::Skip
            }
        },
        Err(RecvError::Lagged(missed)) => {
            debug!(missed, "Stream client fell behind");
            Step::Skip
        }
        Err(RecvError::Closed) => Step::Close,
    }
}

/// Upgrade to a `WebSocket` and stream broadcasts.
///
/// # Route
///
/// `GET /ws/events?channels=`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    let filter = ChannelFilter::parse(query.channels.as_deref());
    ws.on_upgrade(move |socket| stream_events(socket, state, filter))
}

async fn stream_events(mut socket: WebSocket, state: Arc<AppState>, filter: ChannelFilter) {
    let mut rx = state.subscribe();
    debug!(
        subscribers = state.channel.receiver_count(),
        ?filter,
        "Stream client connected"
    );

    loop {
        tokio::select! {
            received = rx.recv() => match step(&filter, received) {
                Step::Send(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Step::Skip => {}
                Step::Close => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                // Client frames carry nothing.
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("Stream client disconnected");
}
