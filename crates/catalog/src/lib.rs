pub mod catalog;
pub mod entry;
pub mod identity;
pub mod matcher;

pub use catalog::{Catalog, filter_by_providers};
pub use entry::{CatalogEntry, EntryKind};
pub use identity::{
    EntryIdentity, derive_identity, extract_series_slug, series_key, series_reference,
};
pub use matcher::{
    EpisodeLookup, LookupQuery, MatchStrength, MovieLookup, SeriesLookup, collect_series_matches,
    first_match, match_episode, match_movie, match_series,
};
