//! Error types for the observer API.
//!
//! [`ObserverError`] converts into an Axum response with a JSON body
//! `{ "error": ..., "status": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use icarus_core::EngineError;

/// Errors surfaced by the observer endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The star-system catalog could not be reached or answered badly.
    #[error("catalog unavailable: {0}")]
    Upstream(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ObserverError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Catalog(e) => Self::Upstream(e.to_string()),
            EngineError::Source(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
