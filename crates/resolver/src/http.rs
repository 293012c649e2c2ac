//! reqwest-backed [`CatalogSource`] talking to the resolver service.

use std::time::Duration;

use relayfin_catalog::CatalogEntry;
use relayfin_core::ConfigSnapshot;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::FetchError;
use crate::source::{CatalogSource, HealthPayload, PlaybackPayload};

const API_KEY_HEADER: &str = "X-Api-Key";
const USER_AGENT: &str = concat!("relayfin/", env!("CARGO_PKG_VERSION"));

pub struct HttpCatalogSource {
    client: reqwest::Client,
}

impl HttpCatalogSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Reuse an existing client, e.g. one shared with the host.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        config: &ConfigSnapshot,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = config.endpoint(path);
        debug!(url = %url, "resolver request");

        let mut request = self.client.get(&url).query(params);
        if let Some(key) = config.api_key() {
            request = request.header(API_KEY_HEADER, key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        resp.json()
            .await
            .map_err(|e| FetchError::Decode(format!("parse JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(
        &self,
        config: &ConfigSnapshot,
    ) -> Result<Vec<CatalogEntry>, FetchError> {
        self.get_json(config, "catalog", &[]).await
    }

    async fn fetch_playback(
        &self,
        config: &ConfigSnapshot,
        id: &str,
    ) -> Result<PlaybackPayload, FetchError> {
        let path = format!("play/{}", urlencoding::encode(id));
        self.get_json(config, &path, &[("format", "json")]).await
    }

    async fn fetch_health(&self, config: &ConfigSnapshot) -> Result<HealthPayload, FetchError> {
        self.get_json(config, "health", &[]).await
    }
}
