use chrono::{DateTime, Utc};
use relayfin_catalog::CatalogEntry;
use relayfin_core::ConfigSnapshot;
use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Network side of the resolver: the only component doing I/O.
///
/// Each call receives the snapshot it runs under so a configuration change
/// takes effect on the very next request.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// `GET {base}/catalog`
    async fn fetch_catalog(&self, config: &ConfigSnapshot)
    -> Result<Vec<CatalogEntry>, FetchError>;

    /// `GET {base}/play/{id}?format=json`
    async fn fetch_playback(
        &self,
        config: &ConfigSnapshot,
        id: &str,
    ) -> Result<PlaybackPayload, FetchError>;

    /// `GET {base}/health`
    async fn fetch_health(&self, config: &ConfigSnapshot) -> Result<HealthPayload, FetchError>;
}

/// Body of `/play/{id}?format=json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// A short-lived playback URL for a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackInfo {
    pub id: String,
    pub token: Option<String>,
    pub stream_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlaybackInfo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Body of `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    #[serde(default)]
    pub cache_size: Option<u64>,
}

/// Outcome of a health probe. Probe failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub status: String,
    pub cache_size: Option<u64>,
    pub summary: String,
}

impl HealthStatus {
    pub fn from_payload(payload: HealthPayload) -> Self {
        let healthy = payload.status.trim().eq_ignore_ascii_case("ok");
        let summary = match (healthy, payload.cache_size) {
            (true, Some(size)) => format!("resolver is healthy ({size} cached tokens)"),
            (true, None) => "resolver is healthy".to_string(),
            (false, _) => format!("resolver reported status {:?}", payload.status),
        };
        Self {
            healthy,
            status: payload.status,
            cache_size: payload.cache_size,
            summary,
        }
    }

    /// Synthetic status for a probe that did not produce a usable payload.
    pub fn unhealthy(summary: impl Into<String>) -> Self {
        Self {
            healthy: false,
            status: "unreachable".to_string(),
            cache_size: None,
            summary: summary.into(),
        }
    }
}
