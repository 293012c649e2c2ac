//! Identity matching between local library items and catalog entries.
//!
//! One pure function per media kind. Each walks an ordered list of
//! strategies and reports which one matched. Catalog lookups take the first
//! matching entry in catalog order.

use std::collections::HashSet;

use relayfin_core::MediaKind;

use crate::entry::CatalogEntry;
use crate::identity::{extract_series_slug, series_key};

/// How an entry was matched, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchStrength {
    /// Only season/episode numbers were checked.
    Loose,
    /// One title contains the other.
    PartialTitle,
    /// Titles equal ignoring case.
    ExactTitle,
    /// Series slug taken from a stored provider id.
    SeriesSlug,
    /// Stored provider id equals the entry id.
    ProviderId,
}

/// Local movie as known to the host library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieLookup {
    pub title: String,
    pub original_title: Option<String>,
    pub provider_id: Option<String>,
}

/// Local series as known to the host library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesLookup {
    pub name: String,
    pub original_name: Option<String>,
    /// Either a full episode id or a `site:slug` series reference.
    pub provider_id: Option<String>,
}

/// Local episode as known to the host library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeLookup {
    pub series_name: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub provider_id: Option<String>,
    pub series_provider_id: Option<String>,
}

/// A lookup for any media kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    Movie(MovieLookup),
    Series(SeriesLookup),
    Episode(EpisodeLookup),
}

impl LookupQuery {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Movie(_) => MediaKind::Movie,
            Self::Series(_) => MediaKind::Series,
            Self::Episode(_) => MediaKind::Episode,
        }
    }

    pub fn match_entry(&self, entry: &CatalogEntry) -> Option<MatchStrength> {
        match self {
            Self::Movie(q) => match_movie(entry, q),
            Self::Series(q) => match_series(entry, q),
            Self::Episode(q) => match_episode(entry, q),
        }
    }
}

pub fn match_movie(entry: &CatalogEntry, query: &MovieLookup) -> Option<MatchStrength> {
    if !entry.is_movie() {
        return None;
    }
    if provider_id_matches(query.provider_id.as_deref(), entry) {
        return Some(MatchStrength::ProviderId);
    }
    title_strength(
        &local_titles(Some(query.title.as_str()), query.original_title.as_deref()),
        entry,
    )
}

pub fn match_series(entry: &CatalogEntry, query: &SeriesLookup) -> Option<MatchStrength> {
    if !entry.is_episode() {
        return None;
    }
    if provider_id_matches(query.provider_id.as_deref(), entry) {
        return Some(MatchStrength::ProviderId);
    }
    if slug_matches(query.provider_id.as_deref(), entry) {
        return Some(MatchStrength::SeriesSlug);
    }
    title_strength(
        &local_titles(Some(query.name.as_str()), query.original_name.as_deref()),
        entry,
    )
}

pub fn match_episode(entry: &CatalogEntry, query: &EpisodeLookup) -> Option<MatchStrength> {
    if !entry.is_episode() {
        return None;
    }
    if provider_id_matches(query.provider_id.as_deref(), entry) {
        return Some(MatchStrength::ProviderId);
    }
    if slug_matches(query.provider_id.as_deref(), entry)
        || slug_matches(query.series_provider_id.as_deref(), entry)
    {
        return numbers_agree(query, entry).then_some(MatchStrength::SeriesSlug);
    }

    let names = local_titles(query.series_name.as_deref(), None);
    let strength = if names.is_empty() {
        MatchStrength::Loose
    } else {
        title_strength(&names, entry)?
    };
    numbers_agree(query, entry).then_some(strength)
}

/// Season and episode agree unless both sides know a number and differ.
///
/// A missing number on either side is a wildcard.
fn numbers_agree(query: &EpisodeLookup, entry: &CatalogEntry) -> bool {
    number_agrees(query.season, entry.season_number())
        && number_agrees(query.episode, entry.episode_number())
}

fn number_agrees(query: Option<u32>, derived: Option<u32>) -> bool {
    match (query, derived) {
        (Some(q), Some(d)) => q == d,
        _ => true,
    }
}

/// Case folding shared by the id and slug tiers.
fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

fn provider_id_matches(provider_id: Option<&str>, entry: &CatalogEntry) -> bool {
    provider_id
        .map(fold)
        .is_some_and(|id| !id.is_empty() && id == fold(entry.id()))
}

fn slug_matches(provider_id: Option<&str>, entry: &CatalogEntry) -> bool {
    provider_id
        .and_then(extract_series_slug)
        .is_some_and(|slug| fold(&slug) == fold(&series_key(entry.series_slug())))
}

fn local_titles<'a>(title: Option<&'a str>, original: Option<&'a str>) -> Vec<String> {
    title
        .into_iter()
        .chain(original)
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Strongest title relation between any local title and any entry title.
pub fn title_strength(local: &[String], entry: &CatalogEntry) -> Option<MatchStrength> {
    let mut best = None;
    for remote in entry.titles().map(str::to_lowercase) {
        for local in local {
            let strength = if *local == remote {
                MatchStrength::ExactTitle
            } else if remote.contains(local.as_str()) || local.contains(remote.as_str()) {
                MatchStrength::PartialTitle
            } else {
                continue;
            };
            best = best.max(Some(strength));
        }
    }
    best
}

/// First entry in catalog order that matches at all.
pub fn first_match<'a, F>(entries: &'a [CatalogEntry], matcher: F) -> Option<&'a CatalogEntry>
where
    F: Fn(&CatalogEntry) -> Option<MatchStrength>,
{
    entries.iter().find(|entry| matcher(entry).is_some())
}

/// Every series matching the query, one entry per series slug.
///
/// Keeps the first entry encountered for each series, in catalog order.
pub fn collect_series_matches<'a>(
    entries: &'a [CatalogEntry],
    query: &SeriesLookup,
) -> Vec<&'a CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| match_series(entry, query).is_some())
        .filter(|entry| {
            let key = if entry.series_slug().is_empty() {
                entry.id().to_lowercase()
            } else {
                entry.series_slug().to_lowercase()
            };
            seen.insert(key)
        })
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::series_reference;

    fn nobody() -> CatalogEntry {
        CatalogEntry::movie("hdfilm:nobody-2", "hdfilm", "Nobody 2")
    }

    fn kara_sevda(season: u32, episode: u32) -> CatalogEntry {
        CatalogEntry::episode(
            &format!("dizibox:kara-sevda:s{season:02}e{episode:02}"),
            "dizibox",
            "Kara Sevda",
        )
        .with_original_title("Endless Love")
    }

    fn movie(title: &str, provider_id: Option<&str>) -> MovieLookup {
        MovieLookup {
            title: title.into(),
            original_title: None,
            provider_id: provider_id.map(Into::into),
        }
    }

    #[test]
    fn movie_provider_id_beats_title() {
        let q = movie("Something Else Entirely", Some("hdfilm:nobody-2"));
        assert_eq!(match_movie(&nobody(), &q), Some(MatchStrength::ProviderId));
    }

    #[test]
    fn movie_provider_id_ignores_case() {
        let q = movie("x", Some("HDFILM:Nobody-2"));
        assert_eq!(match_movie(&nobody(), &q), Some(MatchStrength::ProviderId));
    }

    #[test]
    fn movie_exact_and_partial_titles() {
        assert_eq!(
            match_movie(&nobody(), &movie("nobody 2", None)),
            Some(MatchStrength::ExactTitle)
        );
        assert_eq!(
            match_movie(&nobody(), &movie("Nobody", None)),
            Some(MatchStrength::PartialTitle)
        );
        assert_eq!(
            match_movie(&nobody(), &movie("Nobody 2 (2025)", None)),
            Some(MatchStrength::PartialTitle)
        );
        assert_eq!(match_movie(&nobody(), &movie("Inception", None)), None);
    }

    #[test]
    fn movie_original_title_is_checked() {
        let entry = CatalogEntry::movie(
            "hdfilm:yedinci-kogustaki-mucize",
            "hdfilm",
            "Yedinci Koğuştaki Mucize",
        )
        .with_original_title("Miracle in Cell No. 7");
        let q = MovieLookup {
            title: "Cell 7".into(),
            original_title: Some("Miracle in Cell No. 7".into()),
            provider_id: None,
        };
        assert_eq!(match_movie(&entry, &q), Some(MatchStrength::ExactTitle));
    }

    #[test]
    fn movie_blank_title_never_matches() {
        assert_eq!(match_movie(&nobody(), &movie("   ", None)), None);
    }

    #[test]
    fn movie_matcher_skips_episodes() {
        let q = movie("Kara Sevda", Some("dizibox:kara-sevda:s01e01"));
        assert_eq!(match_movie(&kara_sevda(1, 1), &q), None);
    }

    #[test]
    fn series_matches_by_episode_id_slug_and_title() {
        let entry = kara_sevda(2, 5);
        let by_id = SeriesLookup {
            name: "unrelated".into(),
            provider_id: Some("dizibox:kara-sevda:s02e05".into()),
            ..Default::default()
        };
        assert_eq!(match_series(&entry, &by_id), Some(MatchStrength::ProviderId));

        let by_slug = SeriesLookup {
            name: "unrelated".into(),
            provider_id: Some("dizibox:Kara-Sevda".into()),
            ..Default::default()
        };
        assert_eq!(match_series(&entry, &by_slug), Some(MatchStrength::SeriesSlug));

        let by_original = SeriesLookup {
            name: "Endless Love".into(),
            ..Default::default()
        };
        assert_eq!(match_series(&entry, &by_original), Some(MatchStrength::ExactTitle));
    }

    #[test]
    fn series_matcher_skips_movies() {
        let q = SeriesLookup {
            name: "Nobody 2".into(),
            ..Default::default()
        };
        assert_eq!(match_series(&nobody(), &q), None);
    }

    #[test]
    fn series_matches_are_deduplicated_by_slug() {
        let entries = vec![
            kara_sevda(1, 1),
            kara_sevda(1, 2),
            CatalogEntry::episode("dizibox:kara-para-ask:s01e01", "dizibox", "Kara Para Aşk"),
            kara_sevda(2, 1),
            nobody(),
        ];
        let q = SeriesLookup {
            name: "Kara".into(),
            ..Default::default()
        };
        let found = collect_series_matches(&entries, &q);
        let ids: Vec<&str> = found.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["dizibox:kara-sevda:s01e01", "dizibox:kara-para-ask:s01e01"]);
    }

    #[test]
    fn episode_provider_id_wins() {
        let q = EpisodeLookup {
            series_name: Some("Something Else".into()),
            season: Some(9),
            provider_id: Some("dizibox:kara-sevda:s02e05".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(2, 5), &q), Some(MatchStrength::ProviderId));
    }

    #[test]
    fn episode_series_provider_id_confirms_numbers() {
        let q = EpisodeLookup {
            season: Some(2),
            episode: Some(5),
            series_provider_id: Some("dizibox:kara-sevda".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(2, 5), &q), Some(MatchStrength::SeriesSlug));
        assert_eq!(match_episode(&kara_sevda(2, 6), &q), None);
    }

    #[test]
    fn episode_slug_from_sibling_episode_id() {
        let q = EpisodeLookup {
            season: Some(1),
            episode: Some(3),
            provider_id: Some("dizibox:kara-sevda:s01e02".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(1, 3), &q), Some(MatchStrength::SeriesSlug));
        assert_eq!(match_episode(&kara_sevda(1, 2), &q), Some(MatchStrength::ProviderId));
    }

    #[test]
    fn episode_wrong_series_name_short_circuits() {
        let q = EpisodeLookup {
            series_name: Some("Breaking Bad".into()),
            season: Some(2),
            episode: Some(5),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(2, 5), &q), None);
    }

    #[test]
    fn episode_name_and_numbers() {
        let q = EpisodeLookup {
            series_name: Some("kara sevda".into()),
            season: Some(2),
            episode: Some(5),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(2, 5), &q), Some(MatchStrength::ExactTitle));
        assert_eq!(match_episode(&kara_sevda(2, 4), &q), None);
        assert_eq!(match_episode(&kara_sevda(3, 5), &q), None);
    }

    #[test]
    fn episode_missing_numbers_are_wildcards() {
        // Entry without any derivable numbers.
        let bare = CatalogEntry::episode("dizibox:kara-sevda-final", "dizibox", "Kara Sevda");
        let q = EpisodeLookup {
            series_name: Some("Kara Sevda".into()),
            season: Some(2),
            episode: Some(5),
            ..Default::default()
        };
        assert_eq!(match_episode(&bare, &q), Some(MatchStrength::ExactTitle));

        // Query without numbers.
        let q = EpisodeLookup {
            series_name: Some("Kara Sevda".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(4, 1), &q), Some(MatchStrength::ExactTitle));
    }

    #[test]
    fn episode_without_series_name_is_loose() {
        let q = EpisodeLookup {
            season: Some(2),
            episode: Some(5),
            ..Default::default()
        };
        assert_eq!(match_episode(&kara_sevda(2, 5), &q), Some(MatchStrength::Loose));
    }

    #[test]
    fn episode_subtitle_numbers_are_used() {
        let entry = CatalogEntry::episode("dizipub:kara-sevda-bolum", "dizipub", "Kara Sevda")
            .with_subtitle("Sezon 2 Bölüm 5");
        let q = EpisodeLookup {
            series_name: Some("Kara Sevda".into()),
            season: Some(2),
            episode: Some(6),
            ..Default::default()
        };
        assert_eq!(match_episode(&entry, &q), None);
    }

    #[test]
    fn first_match_follows_catalog_order() {
        let entries = vec![
            CatalogEntry::movie("hdfilm:nobody", "hdfilm", "Nobody"),
            nobody(),
        ];
        // "Nobody" is a substring of "Nobody 2" and comes first.
        let q = LookupQuery::Movie(movie("Nobody 2", None));
        let found = first_match(&entries, |e| q.match_entry(e)).unwrap();
        assert_eq!(found.id(), "hdfilm:nobody");

        let q = LookupQuery::Movie(movie("Inception", None));
        assert!(first_match(&entries, |e| q.match_entry(e)).is_none());
    }

    #[test]
    fn first_match_skips_non_matching_entries() {
        let entries = vec![
            kara_sevda(1, 1),
            CatalogEntry::movie("hdfilm:dune-1984", "hdfilm", "Dune"),
            CatalogEntry::movie("hdfilm:dune-2021", "hdfilm", "Dune"),
        ];
        let q = LookupQuery::Movie(movie("Dune", None));
        let found = first_match(&entries, |e| q.match_entry(e)).unwrap();
        assert_eq!(found.id(), "hdfilm:dune-1984");
    }

    #[test]
    fn id_and_slug_tiers_fold_unicode_case() {
        let entry = CatalogEntry::episode("dizibox:aşk-101:s01e02", "dizibox", "Aşk 101");
        let by_id = EpisodeLookup {
            provider_id: Some("DIZIBOX:AŞK-101:S01E02".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&entry, &by_id), Some(MatchStrength::ProviderId));

        let by_slug = EpisodeLookup {
            season: Some(1),
            episode: Some(2),
            series_provider_id: Some("dizibox:AŞK-101".into()),
            ..Default::default()
        };
        assert_eq!(match_episode(&entry, &by_slug), Some(MatchStrength::SeriesSlug));
    }

    #[test]
    fn non_composite_series_reference_matches_its_own_series() {
        let kizilcik = CatalogEntry::episode(
            "dizipub:kizilcik-serbeti-bolum",
            "dizipub",
            "Kızılcık Şerbeti",
        )
        .with_subtitle("3. Sezon 14. Bölüm");
        let yali = CatalogEntry::episode("dizipub:yali-capkini-bolum", "dizipub", "Yalı Çapkını")
            .with_subtitle("3. Sezon 14. Bölüm");
        let reference = series_reference(yali.site(), yali.series_slug());
        assert_eq!(reference, "dizipub:yali-capkini-bolum");

        let q = EpisodeLookup {
            season: Some(3),
            episode: Some(14),
            series_provider_id: Some(reference.clone()),
            ..Default::default()
        };
        assert_eq!(match_episode(&yali, &q), Some(MatchStrength::SeriesSlug));
        assert_eq!(match_episode(&kizilcik, &q), Some(MatchStrength::Loose));

        let series = SeriesLookup {
            provider_id: Some(reference),
            ..Default::default()
        };
        let entries = [kizilcik, yali];
        let found = collect_series_matches(&entries, &series);
        let ids: Vec<&str> = found.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["dizipub:yali-capkini-bolum"]);
    }

    #[test]
    fn lookup_query_reports_kind() {
        assert_eq!(LookupQuery::Movie(MovieLookup::default()).kind(), MediaKind::Movie);
        assert_eq!(LookupQuery::Series(SeriesLookup::default()).kind(), MediaKind::Series);
        assert_eq!(LookupQuery::Episode(EpisodeLookup::default()).kind(), MediaKind::Episode);
    }
}
