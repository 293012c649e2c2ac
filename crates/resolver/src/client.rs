//! The resolver client: the host-facing entry point of the engine.
//!
//! Construct one per host and share it (`Arc<ResolverClient>`). Every
//! operation reads the live settings, consults the cache and only touches
//! the network when the cache cannot answer.

use std::future::Future;
use std::sync::Arc;

use relayfin_catalog::{
    Catalog, CatalogEntry, EpisodeLookup, LookupQuery, MovieLookup, SeriesLookup,
    collect_series_matches, first_match, match_episode, match_movie, match_series,
};
use relayfin_core::{ConfigSnapshot, SettingsProvider};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheLookup, CacheStatus, CatalogCache};
use crate::http::HttpCatalogSource;
use crate::source::{CatalogSource, HealthStatus, PlaybackInfo, PlaybackPayload};
use crate::{Cancelled, FetchError};

pub struct ResolverClient<S = HttpCatalogSource> {
    settings: Arc<dyn SettingsProvider>,
    source: S,
    cache: CatalogCache,
}

impl ResolverClient<HttpCatalogSource> {
    /// Client talking HTTP, with the request timeout taken from the settings
    /// at construction time.
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        let timeout = settings.current().request_timeout();
        Self::with_source(settings, HttpCatalogSource::new(timeout))
    }
}

impl<S: CatalogSource> ResolverClient<S> {
    pub fn with_source(settings: Arc<dyn SettingsProvider>, source: S) -> Self {
        Self {
            settings,
            source,
            cache: CatalogCache::new(),
        }
    }

    /// Normalized view of the live settings.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from_settings(&self.settings.current())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The provider-filtered catalog, from cache when fresh.
    ///
    /// Fetch failures fall back to the last cached catalog (or an empty one)
    /// and are only logged. Cancellation is returned as [`Cancelled`].
    pub async fn get_catalog(&self, cancel: &CancellationToken) -> Result<Arc<Catalog>, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let snapshot = self.snapshot();
        if let CacheLookup::Fresh(catalog) = self.cache.lookup(&snapshot).await {
            debug!(entries = catalog.len(), "catalog served from cache");
            return Ok(catalog);
        }

        match cancellable(cancel, self.source.fetch_catalog(&snapshot)).await {
            Ok(entries) => {
                let fetched = entries.len();
                let catalog =
                    Arc::new(Catalog::new(entries).filter_by_providers(snapshot.providers()));
                info!(
                    fetched,
                    kept = catalog.len(),
                    providers = ?snapshot.providers(),
                    "catalog fetched"
                );
                if !self.cache.store(&snapshot, Arc::clone(&catalog)).await {
                    // Uncached: still index this snapshot for the caller.
                    catalog.index();
                }
                Ok(catalog)
            }
            Err(FetchError::Cancelled) => Err(Cancelled),
            Err(e) => {
                let fallback = self.cache.fallback(&snapshot).await;
                warn!(
                    error = %e,
                    base_url = snapshot.base_url(),
                    fallback_entries = fallback.len(),
                    "catalog fetch failed, serving cached catalog"
                );
                Ok(fallback)
            }
        }
    }

    /// Catalog entry by exact id.
    pub async fn get_entry_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CatalogEntry>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        let entry = if catalog.has_index() {
            catalog.get(id)
        } else {
            catalog.scan(id)
        };
        Ok(entry.cloned())
    }

    pub async fn find_movie(
        &self,
        query: &MovieLookup,
        cancel: &CancellationToken,
    ) -> Result<Option<CatalogEntry>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        Ok(first_match(catalog.entries(), |e| match_movie(e, query)).cloned())
    }

    /// All series matching the query, one representative episode per series.
    pub async fn find_series_matches(
        &self,
        query: &SeriesLookup,
        cancel: &CancellationToken,
    ) -> Result<Vec<CatalogEntry>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        Ok(collect_series_matches(catalog.entries(), query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn find_series(
        &self,
        query: &SeriesLookup,
        cancel: &CancellationToken,
    ) -> Result<Option<CatalogEntry>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        Ok(first_match(catalog.entries(), |e| match_series(e, query)).cloned())
    }

    pub async fn find_episode(
        &self,
        query: &EpisodeLookup,
        cancel: &CancellationToken,
    ) -> Result<Option<CatalogEntry>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        Ok(first_match(catalog.entries(), |e| match_episode(e, query)).cloned())
    }

    /// First match for a query of any kind.
    pub async fn find(
        &self,
        query: &LookupQuery,
        cancel: &CancellationToken,
    ) -> Result<Option<CatalogEntry>, Cancelled> {
        match query {
            LookupQuery::Movie(q) => self.find_movie(q, cancel).await,
            LookupQuery::Series(q) => self.find_series(q, cancel).await,
            LookupQuery::Episode(q) => self.find_episode(q, cancel).await,
        }
    }

    /// Obtain a short-lived stream URL for a catalog id.
    ///
    /// `Ok(None)` when the resolver cannot produce one; the reason is logged.
    pub async fn resolve_playback(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PlaybackInfo>, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let snapshot = self.snapshot();
        match cancellable(cancel, self.source.fetch_playback(&snapshot, id)).await {
            Ok(payload) => Ok(playback_info(&snapshot, id, payload)),
            Err(FetchError::Cancelled) => Err(Cancelled),
            Err(e) => {
                warn!(id, error = %e, "playback resolution failed");
                Ok(None)
            }
        }
    }

    /// Probe the resolver. Failures come back as an unhealthy status.
    pub async fn health(&self, cancel: &CancellationToken) -> Result<HealthStatus, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let snapshot = self.snapshot();
        match cancellable(cancel, self.source.fetch_health(&snapshot)).await {
            Ok(payload) => Ok(HealthStatus::from_payload(payload)),
            Err(FetchError::Cancelled) => Err(Cancelled),
            Err(FetchError::Status(code)) => Ok(HealthStatus::unhealthy(format!("HTTP {code}"))),
            Err(e) => Ok(HealthStatus::unhealthy(e.to_string())),
        }
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.status().await
    }

    /// Forget the cached catalog; the next access fetches.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
        info!("catalog cache invalidated");
    }
}

/// Run `fut` until it completes or `cancel` fires. Dropping the future
/// aborts the in-flight request.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = fut => result,
    }
}

fn playback_info(snapshot: &ConfigSnapshot, id: &str, payload: PlaybackPayload) -> Option<PlaybackInfo> {
    let Some(stream_url) = payload
        .stream_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        warn!(id, "resolver returned no stream url");
        return None;
    };

    let stream_url = reqwest::Url::parse(snapshot.base_url())
        .and_then(|base| base.join(stream_url))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| stream_url.to_string());

    let expires_at = payload.expires_at.as_deref().and_then(|raw| {
        chrono::DateTime::parse_from_rfc3339(raw.trim())
            .map(|at| at.with_timezone(&chrono::Utc))
            .inspect_err(|e| debug!(id, raw, error = %e, "unparseable playback expiry"))
            .ok()
    });

    Some(PlaybackInfo {
        id: id.to_string(),
        token: payload.token.filter(|t| !t.trim().is_empty()),
        stream_url,
        expires_at,
    })
}
