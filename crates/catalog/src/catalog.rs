use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use tracing::debug;

use crate::entry::CatalogEntry;

/// A provider-filtered catalog snapshot with an id index built on demand.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: OnceLock<HashMap<String, usize>>,
}

impl Catalog {
    /// Wrap entries, dropping rows without an id.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let total = entries.len();
        let entries: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|e| !e.id().is_empty())
            .collect();
        if entries.len() != total {
            debug!(dropped = total - entries.len(), "catalog rows without id ignored");
        }
        Self {
            entries,
            index: OnceLock::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_index(&self) -> bool {
        self.index.get().is_some()
    }

    /// The id index, built on first use. The first entry wins on duplicate ids.
    pub fn index(&self) -> &HashMap<String, usize> {
        self.index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.entries.len());
            for (pos, entry) in self.entries.iter().enumerate() {
                index.entry(entry.id().to_string()).or_insert(pos);
            }
            index
        })
    }

    /// Entry by exact id through the index.
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index().get(id).and_then(|pos| self.entries.get(*pos))
    }

    /// Entry by id without touching the index.
    pub fn scan(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Keep only entries from enabled sites.
    ///
    /// Fails closed: an empty provider set yields an empty catalog.
    pub fn filter_by_providers(self, providers: &BTreeSet<String>) -> Self {
        Self::new(filter_by_providers(self.entries, providers))
    }
}

impl From<Vec<CatalogEntry>> for Catalog {
    fn from(entries: Vec<CatalogEntry>) -> Self {
        Self::new(entries)
    }
}

/// Keep entries whose lower-cased site is in `providers`.
///
/// `providers` must already be lower-cased. An empty set keeps nothing.
pub fn filter_by_providers(
    entries: Vec<CatalogEntry>,
    providers: &BTreeSet<String>,
) -> Vec<CatalogEntry> {
    if providers.is_empty() {
        return Vec::new();
    }
    entries
        .into_iter()
        .filter(|e| providers.contains(&e.site().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn providers(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::movie("hdfilm:nobody-2", "HDFilm", "Nobody 2"),
            CatalogEntry::episode("dizibox:kara-sevda:s01e01", "dizibox", "Kara Sevda"),
            CatalogEntry::episode("dizipal:yargi:s01e01", "dizipal", "Yargı"),
        ]
    }

    #[test]
    fn filter_keeps_enabled_sites_case_insensitively() {
        let kept = filter_by_providers(sample(), &providers(&["hdfilm", "dizibox"]));
        let ids: Vec<&str> = kept.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["hdfilm:nobody-2", "dizibox:kara-sevda:s01e01"]);
    }

    #[test]
    fn filter_fails_closed_on_empty_set() {
        assert!(filter_by_providers(sample(), &BTreeSet::new()).is_empty());
        assert!(Catalog::new(sample()).filter_by_providers(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn index_is_lazy_and_first_wins() {
        let catalog = Catalog::new(vec![
            CatalogEntry::movie("hdfilm:dune", "hdfilm", "Dune (1984)"),
            CatalogEntry::movie("hdfilm:dune", "hdfilm", "Dune (2021)"),
            CatalogEntry::movie("", "hdfilm", "No id"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.has_index());

        assert_eq!(catalog.get("hdfilm:dune").unwrap().title(), "Dune (1984)");
        assert!(catalog.has_index());
        assert_eq!(catalog.index().len(), 1);
        assert!(catalog.get("hdfilm:missing").is_none());
    }

    #[test]
    fn scan_matches_index() {
        let catalog = Catalog::new(sample());
        assert_eq!(
            catalog.scan("dizipal:yargi:s01e01").map(|e| e.id()),
            catalog.get("dizipal:yargi:s01e01").map(|e| e.id())
        );
        assert!(!catalog.is_empty());
        assert!(Catalog::empty().is_empty());
    }
}
