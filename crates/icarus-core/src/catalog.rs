//! External star-system catalog contract.

use async_trait::async_trait;
use icarus_types::{Body, Station};

/// Errors raised by catalog lookups.
///
/// Never cached: a later lookup for the same system retries.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request could not be sent or timed out.
    #[error("catalog request failed: {0}")]
    Request(String),

    /// The catalog answered with a non-success status.
    #[error("catalog returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body was not the expected shape.
    #[error("catalog response decode failed: {0}")]
    Decode(String),
}

/// Looks up static data for a star system by name.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Bodies (stars, planets, moons) in the system.
    async fn bodies(&self, system_name: &str) -> Result<Vec<Body>, CatalogError>;

    /// Stations and settlements in the system.
    async fn stations(&self, system_name: &str) -> Result<Vec<Station>, CatalogError>;
}
