//! In-memory catalog cache.
//!
//! A single mutex guards the cached catalog, its fetch time and the snapshot
//! that produced it. Critical sections only read or swap state; network
//! fetches happen outside the lock, so concurrent callers that see an expired
//! cache may each fetch. The last successful store wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use relayfin_catalog::Catalog;
use relayfin_core::ConfigSnapshot;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Result of asking the cache for a servable catalog.
#[derive(Debug)]
pub enum CacheLookup {
    /// Within the TTL for the current configuration.
    Fresh(Arc<Catalog>),
    /// Expired, disabled, empty or never fetched.
    Miss,
}

/// Diagnostics for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub entries: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub base_url: Option<String>,
    pub providers: Vec<String>,
    pub ttl_secs: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    catalog: Option<Arc<Catalog>>,
    fetched_at: Option<Instant>,
    fetched_at_utc: Option<DateTime<Utc>>,
    applied: Option<ConfigSnapshot>,
}

impl CacheState {
    fn reset(&mut self) {
        self.catalog = None;
        self.fetched_at = None;
        self.fetched_at_utc = None;
    }

    fn applies_to(&self, snapshot: &ConfigSnapshot) -> bool {
        self.applied.as_ref() == Some(snapshot)
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    state: Mutex<CacheState>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `snapshot` and report whether a fresh catalog can be served.
    ///
    /// A snapshot that differs from the applied one clears the cache first,
    /// in the same critical section as the freshness decision.
    pub async fn lookup(&self, snapshot: &ConfigSnapshot) -> CacheLookup {
        let mut state = self.state.lock().await;

        if !state.applies_to(snapshot) {
            if state.applied.is_some() {
                info!(
                    base_url = snapshot.base_url(),
                    providers = ?snapshot.providers(),
                    "resolver configuration changed, catalog cache cleared"
                );
            }
            state.reset();
            state.applied = Some(snapshot.clone());
        }

        let ttl = snapshot.cache_ttl();
        if ttl.is_zero() {
            return CacheLookup::Miss;
        }

        match (&state.catalog, state.fetched_at) {
            (Some(catalog), Some(at)) if at.elapsed() < ttl && !catalog.is_empty() => {
                catalog.index();
                CacheLookup::Fresh(Arc::clone(catalog))
            }
            _ => CacheLookup::Miss,
        }
    }

    /// Replace the cached catalog after a successful fetch.
    ///
    /// Returns `false` without storing when caching is disabled or the
    /// configuration changed while the fetch was in flight.
    pub async fn store(&self, snapshot: &ConfigSnapshot, catalog: Arc<Catalog>) -> bool {
        if snapshot.cache_ttl().is_zero() {
            return false;
        }
        catalog.index();

        let mut state = self.state.lock().await;
        if !state.applies_to(snapshot) {
            debug!("configuration changed during fetch, result not cached");
            return false;
        }
        state.catalog = Some(catalog);
        state.fetched_at = Some(Instant::now());
        state.fetched_at_utc = Some(Utc::now());
        true
    }

    /// Last good catalog for `snapshot`, ignoring age. Empty when caching is
    /// disabled or nothing was fetched under this configuration.
    pub async fn fallback(&self, snapshot: &ConfigSnapshot) -> Arc<Catalog> {
        if snapshot.cache_ttl().is_zero() {
            return Arc::new(Catalog::empty());
        }
        let state = self.state.lock().await;
        match &state.catalog {
            Some(catalog) if state.applies_to(snapshot) => Arc::clone(catalog),
            _ => Arc::new(Catalog::empty()),
        }
    }

    /// Drop the cached catalog so the next access fetches.
    pub async fn clear(&self) {
        self.state.lock().await.reset();
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        let applied = state.applied.as_ref();
        CacheStatus {
            entries: state.catalog.as_ref().map_or(0, |c| c.len()),
            fetched_at: state.fetched_at_utc,
            base_url: applied.map(|s| s.base_url().to_string()),
            providers: applied
                .map(|s| s.providers().iter().cloned().collect())
                .unwrap_or_default(),
            ttl_secs: applied.map_or(Duration::ZERO, |s| s.cache_ttl()).as_secs(),
        }
    }
}
