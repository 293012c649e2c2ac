use serde::{Deserialize, Serialize};

use crate::identity::{EntryIdentity, derive_identity};

/// Stored type of a catalog entry. Series only exist as groups of episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Movie,
    Episode,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of one `/catalog` row.
#[derive(Debug, Deserialize)]
struct RawCatalogEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    site: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "originalTitle")]
    original_title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    backdrop: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default, alias = "tmdbId")]
    tmdb_id: Option<i64>,
    #[serde(rename = "type", default)]
    kind: EntryKind,
}

/// One playable item from the remote catalog.
///
/// Immutable once parsed: the derived identity is computed on construction
/// and stays consistent with `id`/`subtitle` because neither can change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCatalogEntry")]
pub struct CatalogEntry {
    id: String,
    site: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backdrop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tmdb_id: Option<i64>,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(skip)]
    identity: EntryIdentity,
}

impl From<RawCatalogEntry> for CatalogEntry {
    fn from(raw: RawCatalogEntry) -> Self {
        let id = raw.id.trim().to_string();
        let subtitle = non_blank(raw.subtitle);
        let identity = derive_identity(&id, subtitle.as_deref());
        Self {
            id,
            site: raw.site.trim().to_string(),
            title: raw.title.trim().to_string(),
            original_title: non_blank(raw.original_title),
            subtitle,
            overview: non_blank(raw.overview),
            poster: non_blank(raw.poster),
            backdrop: non_blank(raw.backdrop),
            url: non_blank(raw.url),
            year: raw.year.unwrap_or(0),
            tmdb_id: raw.tmdb_id.filter(|id| *id > 0),
            kind: raw.kind,
            identity,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CatalogEntry {
    pub fn new(id: &str, site: &str, kind: EntryKind, title: &str) -> Self {
        Self::from(RawCatalogEntry {
            id: id.to_string(),
            site: site.to_string(),
            title: title.to_string(),
            original_title: None,
            subtitle: None,
            overview: None,
            poster: None,
            backdrop: None,
            url: None,
            year: None,
            tmdb_id: None,
            kind,
        })
    }

    pub fn movie(id: &str, site: &str, title: &str) -> Self {
        Self::new(id, site, EntryKind::Movie, title)
    }

    pub fn episode(id: &str, site: &str, title: &str) -> Self {
        Self::new(id, site, EntryKind::Episode, title)
    }

    pub fn with_original_title(mut self, original_title: &str) -> Self {
        self.original_title = non_blank(Some(original_title.to_string()));
        self
    }

    /// Set the subtitle and re-derive numbers from it.
    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = non_blank(Some(subtitle.to_string()));
        self.identity = derive_identity(&self.id, self.subtitle.as_deref());
        self
    }

    pub fn with_overview(mut self, overview: &str) -> Self {
        self.overview = non_blank(Some(overview.to_string()));
        self
    }

    pub fn with_images(mut self, poster: Option<&str>, backdrop: Option<&str>) -> Self {
        self.poster = non_blank(poster.map(str::to_string));
        self.backdrop = non_blank(backdrop.map(str::to_string));
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_tmdb_id(mut self, tmdb_id: i64) -> Self {
        self.tmdb_id = Some(tmdb_id).filter(|id| *id > 0);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn original_title(&self) -> Option<&str> {
        self.original_title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn overview(&self) -> Option<&str> {
        self.overview.as_deref()
    }

    pub fn poster(&self) -> Option<&str> {
        self.poster.as_deref()
    }

    pub fn backdrop(&self) -> Option<&str> {
        self.backdrop.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Release year, `None` when the catalog stores 0.
    pub fn year(&self) -> Option<i32> {
        (self.year > 0).then_some(self.year)
    }

    pub fn tmdb_id(&self) -> Option<i64> {
        self.tmdb_id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_movie(&self) -> bool {
        self.kind == EntryKind::Movie
    }

    pub fn is_episode(&self) -> bool {
        self.kind == EntryKind::Episode
    }

    pub fn identity(&self) -> &EntryIdentity {
        &self.identity
    }

    pub fn series_slug(&self) -> &str {
        &self.identity.series_slug
    }

    pub fn season_number(&self) -> Option<u32> {
        self.identity.season_number
    }

    pub fn episode_number(&self) -> Option<u32> {
        self.identity.episode_number
    }

    /// Non-blank title and original title, in that order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.original_title.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Case-insensitive site comparison.
    pub fn is_from(&self, site: &str) -> bool {
        self.site.to_lowercase() == site.to_lowercase()
    }
}
