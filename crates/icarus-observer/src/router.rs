//! Axum router construction.
//!
//! Assembles the REST and `WebSocket` routes into a single [`Router`] with
//! CORS enabled so a browser client on another origin can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /ws/events` -- `WebSocket` broadcast stream
/// - `GET /api/host-info`
/// - `GET /api/loading-stats`
/// - `GET /api/commander`
/// - `GET /api/log-entries`
/// - `GET /api/system`
/// - `POST /api/start`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/events", get(ws::ws_events))
        .route("/api/host-info", get(handlers::host_info))
        .route("/api/loading-stats", get(handlers::loading_stats))
        .route("/api/commander", get(handlers::commander))
        .route("/api/log-entries", get(handlers::log_entries))
        .route("/api/system", get(handlers::system))
        .route("/api/start", post(handlers::start))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
