//! EDSM catalog client.
//!
//! Implements the core [`Catalog`] contract against the public EDSM system
//! API. Bodies and stations come from two separate endpoints:
//!
//! - `GET {api_url}/api-system-v1/bodies?systemName=...`
//! - `GET {api_url}/api-system-v1/stations?systemName=...`
//!
//! Both answer with an object carrying the list under `bodies` / `stations`.
//! For systems EDSM has never seen they answer `{}` or `[]`; either reads as
//! an empty list.

use std::time::Duration;

use async_trait::async_trait;
use icarus_core::config::EdsmConfig;
use icarus_core::{Catalog, CatalogError};
use icarus_types::{Body, Station};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

const BODIES_PATH: &str = "api-system-v1/bodies";
const STATIONS_PATH: &str = "api-system-v1/stations";

/// HTTP client for the EDSM system API.
#[derive(Debug, Clone)]
pub struct EdsmClient {
    client: reqwest::Client,
    api_url: String,
}

impl EdsmClient {
    /// Create a client with the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &EdsmConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| CatalogError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Base URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch `{api_url}/{path}` for `system_name` and decode the list under
    /// `key`.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        system_name: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let url = format!("{}/{path}", self.api_url);
        debug!(url = %url, system = system_name, "EDSM request");

        let response = self
            .client
            .get(&url)
            .query(&[("systemName", system_name)])
            .send()
            .await
            .map_err(|e| CatalogError::Request(format!("EDSM request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(format!("EDSM response parse failed: {e}")))?;

        extract_list(json, key)
    }
}

/// The array under `key`, or empty when the response has none.
fn extract_list<T: DeserializeOwned>(mut json: Value, key: &str) -> Result<Vec<T>, CatalogError> {
    match json.get_mut(key).map(Value::take) {
        Some(list @ Value::Array(_)) => serde_json::from_value(list)
            .map_err(|e| CatalogError::Decode(format!("EDSM `{key}` list malformed: {e}"))),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(CatalogError::Decode(format!(
            "EDSM `{key}` is not a list: {other}"
        ))),
    }
}

#[async_trait]
impl Catalog for EdsmClient {
    async fn bodies(&self, system_name: &str) -> Result<Vec<Body>, CatalogError> {
        self.fetch_list(BODIES_PATH, "bodies", system_name).await
    }

    async fn stations(&self, system_name: &str) -> Result<Vec<Station>, CatalogError> {
        self.fetch_list(STATIONS_PATH, "stations", system_name).await
    }
}
