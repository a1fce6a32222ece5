//! Catalog entries and the precomputed icon lookup index

use crate::icon::normalize_lookup_key;
use reliquary_core::GrailItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the external static catalog of collectible definitions.
/// The catalog itself lives outside this crate; resolvers only consume the
/// row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: GrailItemId,
    pub name: String,
    pub item_code: Option<String>,
    pub item_type: Option<String>,
    pub icon: Option<String>,
}

/// Precomputed icon lookup index, built once from the full catalog.
///
/// An explicit constructed value rather than module-scope state: build it at
/// startup, share it read-only. `by_code` and `by_name` are first-writer-wins
/// on collision, which keeps resolution deterministic for codes and names
/// shared by multiple catalog entries.
#[derive(Debug, Clone, Default)]
pub struct IconIndex {
    by_id: HashMap<GrailItemId, String>,
    by_code: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl IconIndex {
    /// Build the index from the catalog. Entries without an icon contribute
    /// nothing.
    pub fn from_catalog(catalog: &[CatalogEntry]) -> IconIndex {
        let mut index = IconIndex::default();
        for entry in catalog {
            let Some(icon) = &entry.icon else {
                continue;
            };
            index.by_id.insert(entry.id.clone(), icon.clone());
            if let Some(code) = &entry.item_code {
                index
                    .by_code
                    .entry(code.to_ascii_lowercase())
                    .or_insert_with(|| icon.clone());
            }
            index
                .by_name
                .entry(normalize_lookup_key(&entry.name))
                .or_insert_with(|| icon.clone());
        }
        index
    }

    /// Direct lookup by catalog id.
    pub fn icon_for_id(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Lookup by item-type code (case-insensitive).
    pub fn icon_for_code(&self, code: &str) -> Option<&str> {
        self.by_code.get(&code.to_ascii_lowercase()).map(String::as_str)
    }

    /// Lookup by normalized display name.
    pub fn icon_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&normalize_lookup_key(name)).map(String::as_str)
    }

    /// Number of catalog ids indexed.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, code: Option<&str>, icon: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            item_code: code.map(str::to_string),
            item_type: None,
            icon: Some(icon.to_string()),
        }
    }

    #[test]
    fn test_index_lookups() {
        let index = IconIndex::from_catalog(&[entry(
            "harlequin_crest",
            "Harlequin Crest",
            Some("uap"),
            "harlequin_crest.png",
        )]);
        assert_eq!(index.icon_for_id("harlequin_crest"), Some("harlequin_crest.png"));
        assert_eq!(index.icon_for_code("UAP"), Some("harlequin_crest.png"));
        assert_eq!(index.icon_for_name("harlequin crest"), Some("harlequin_crest.png"));
        assert_eq!(index.icon_for_name("HARLEQUIN-CREST"), Some("harlequin_crest.png"));
    }

    #[test]
    fn test_first_writer_wins_on_code_collision() {
        let index = IconIndex::from_catalog(&[
            entry("annihilus", "Annihilus", Some("cm1"), "annihilus.png"),
            entry("small_charm", "Small Charm", Some("cm1"), "small_charm.png"),
        ]);
        assert_eq!(index.icon_for_code("cm1"), Some("annihilus.png"));
        // Name lookups stay distinct
        assert_eq!(index.icon_for_name("Small Charm"), Some("small_charm.png"));
    }

    #[test]
    fn test_entries_without_icons_are_skipped() {
        let index = IconIndex::from_catalog(&[CatalogEntry {
            id: "bare".to_string(),
            name: "Bare".to_string(),
            item_code: Some("brx".to_string()),
            item_type: None,
            icon: None,
        }]);
        assert!(index.is_empty());
        assert_eq!(index.icon_for_code("brx"), None);
    }
}
