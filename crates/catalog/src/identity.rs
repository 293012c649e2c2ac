//! Derivation of series/season/episode identity from raw catalog fields.
//!
//! Everything that pattern-matches ids or subtitles lives here so the matcher
//! only ever sees an [`EntryIdentity`].

use regex::Regex;
use std::sync::LazyLock;

/// Identity fields derived from an entry's id and subtitle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryIdentity {
    pub series_slug: String,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
}

/// Parts of a composite episode id `site:series-slug:sNNeNN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId<'a> {
    pub site: &'a str,
    pub series_slug: &'a str,
    pub season: u32,
    pub episode: u32,
}

// dizibox:kara-sevda:s02e05
static RE_COMPOSITE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([^:]+):(.+):s(\d+)e(\d+)$").unwrap()
});

// S02E05 inside free text
static RE_SXXEXX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs(\d{1,3})\s*e(\d{1,4})\b").unwrap()
});

// "2. Sezon", "2. Season"
static RE_SEASON_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\.\s*(?:sezon|season)").unwrap()
});

// "Sezon 2", "Season 2"
static RE_SEASON_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:sezon|season)\s*(\d+)").unwrap()
});

// "5. Bölüm", "5. Episode"
static RE_EPISODE_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\.\s*(?:b[öo]l[üu]m|episode)").unwrap()
});

// "Bölüm 5", "Episode 5"
static RE_EPISODE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:b[öo]l[üu]m|episode)\s*(\d+)").unwrap()
});

/// Split a composite episode id. Returns `None` for anything else.
pub fn parse_composite_id(id: &str) -> Option<CompositeId<'_>> {
    let caps = RE_COMPOSITE_ID.captures(id.trim())?;
    Some(CompositeId {
        site: caps.get(1)?.as_str(),
        series_slug: caps.get(2)?.as_str(),
        season: caps[3].parse().ok()?,
        episode: caps[4].parse().ok()?,
    })
}

/// Derive identity fields for an entry.
///
/// Numbers come from the composite id when it has them, otherwise from the
/// subtitle. The slug falls back to the raw id.
pub fn derive_identity(id: &str, subtitle: Option<&str>) -> EntryIdentity {
    if let Some(composite) = parse_composite_id(id) {
        return EntryIdentity {
            series_slug: composite.series_slug.to_string(),
            season_number: Some(composite.season),
            episode_number: Some(composite.episode),
        };
    }

    let (season_number, episode_number) = subtitle.map(parse_subtitle).unwrap_or((None, None));
    EntryIdentity {
        series_slug: id.trim().to_string(),
        season_number,
        episode_number,
    }
}

/// Pull season/episode numbers out of free text such as `Sezon 2 Bölüm 5`.
pub fn parse_subtitle(text: &str) -> (Option<u32>, Option<u32>) {
    if let Some(caps) = RE_SXXEXX.captures(text) {
        return (caps[1].parse().ok(), caps[2].parse().ok());
    }

    // Ordinal forms first: in "2. Sezon 5. Bölüm" the keyword-first pattern
    // would pair "Sezon" with the 5.
    let season = first_number(&RE_SEASON_ORDINAL, text)
        .or_else(|| first_number(&RE_SEASON_KEYWORD, text));
    let episode = first_number(&RE_EPISODE_ORDINAL, text)
        .or_else(|| first_number(&RE_EPISODE_KEYWORD, text));
    (season, episode)
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text).and_then(|c| c[1].parse().ok())
}

/// Series slug referenced by a stored provider id.
///
/// Accepts a full episode id (`site:slug:s01e02`), a series reference
/// (`site:slug`) or a bare slug.
pub fn extract_series_slug(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(composite) = parse_composite_id(value) {
        return Some(composite.series_slug.to_string());
    }

    let mut parts = value.splitn(3, ':');
    let first = parts.next()?;
    match parts.next() {
        Some(slug) if !slug.trim().is_empty() => Some(slug.trim().to_string()),
        Some(_) => None,
        None => Some(first.to_string()),
    }
}

/// Comparable series key of a derived slug.
///
/// A slug that fell back to a raw `site:slug` id loses its site prefix, so it
/// compares equal to what [`extract_series_slug`] reads from a reference.
pub fn series_key(series_slug: &str) -> String {
    extract_series_slug(series_slug).unwrap_or_else(|| series_slug.trim().to_string())
}

/// Provider id the host stores for a whole series: `site:slug`.
pub fn series_reference(site: &str, series_slug: &str) -> String {
    format!("{}:{}", site.to_lowercase(), series_key(series_slug))
}
