//! Records handed to the host's metadata pipeline.

use relayfin_catalog::{CatalogEntry, LookupQuery, collect_series_matches, series_reference};
use relayfin_core::MediaKind;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::source::CatalogSource;
use crate::{Cancelled, ResolverClient};

/// Key under which the host stores catalog provider ids.
pub const PROVIDER_KEY: &str = "relayfin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSearchResult {
    pub kind: MediaKind,
    pub provider_id: String,
    pub name: String,
    pub original_name: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub kind: MediaKind,
    pub provider_id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub year: Option<i32>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub tmdb_id: Option<i64>,
    pub series_slug: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
}

impl MetadataRecord {
    pub fn from_entry(kind: MediaKind, entry: &CatalogEntry) -> Self {
        let slug = Some(entry.series_slug())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let (title, numbers) = match kind {
            MediaKind::Movie | MediaKind::Series => (entry.title(), (None, None)),
            MediaKind::Episode => (
                entry.subtitle().unwrap_or(entry.title()),
                (entry.season_number(), entry.episode_number()),
            ),
        };
        Self {
            kind,
            provider_id: provider_id_for(kind, entry),
            title: title.to_string(),
            original_title: entry.original_title().map(str::to_string),
            overview: entry.overview().map(str::to_string),
            year: entry.year(),
            poster_url: entry.poster().map(str::to_string),
            backdrop_url: entry.backdrop().map(str::to_string),
            tmdb_id: entry.tmdb_id(),
            series_slug: if kind == MediaKind::Movie { None } else { slug },
            season_number: numbers.0,
            episode_number: numbers.1,
        }
    }
}

impl RemoteSearchResult {
    pub fn from_entry(kind: MediaKind, entry: &CatalogEntry) -> Self {
        Self {
            kind,
            provider_id: provider_id_for(kind, entry),
            name: entry.title().to_string(),
            original_name: entry.original_title().map(str::to_string),
            year: entry.year(),
            overview: entry.overview().map(str::to_string),
            image_url: entry.poster().map(str::to_string),
        }
    }
}

/// Series are keyed by `site:slug` so episode lookups can reuse the id.
fn provider_id_for(kind: MediaKind, entry: &CatalogEntry) -> String {
    match kind {
        MediaKind::Series if !entry.series_slug().is_empty() => {
            series_reference(entry.site(), entry.series_slug())
        }
        _ => entry.id().to_string(),
    }
}

impl<S: CatalogSource> ResolverClient<S> {
    /// Every catalog match for the query, in catalog order.
    pub async fn search(
        &self,
        query: &LookupQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteSearchResult>, Cancelled> {
        let catalog = self.get_catalog(cancel).await?;
        let kind = query.kind();

        let entries: Vec<&CatalogEntry> = match query {
            LookupQuery::Series(q) => collect_series_matches(catalog.entries(), q),
            _ => catalog
                .entries()
                .iter()
                .filter(|e| query.match_entry(e).is_some())
                .collect(),
        };

        Ok(entries
            .into_iter()
            .map(|e| RemoteSearchResult::from_entry(kind, e))
            .collect())
    }

    /// Metadata for the first match, if any.
    pub async fn metadata(
        &self,
        query: &LookupQuery,
        cancel: &CancellationToken,
    ) -> Result<Option<MetadataRecord>, Cancelled> {
        let kind = query.kind();
        Ok(self
            .find(query, cancel)
            .await?
            .map(|entry| MetadataRecord::from_entry(kind, &entry)))
    }
}
