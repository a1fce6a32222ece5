//! Search facade
//!
//! Read-only, filtered, paginated views over stored vault items for the UI.
//! Composes on the same storage port the engine writes through; the port's
//! snapshot consistency is all the isolation a read needs.

use crate::engine::VaultEngine;
use reliquary_core::{ReliquaryResult, VaultItemFilter, VaultItemPage};

impl VaultEngine {
    /// Execute a filtered, sorted, 1-based-paginated query.
    ///
    /// Free text matches case-insensitively against item name, item code,
    /// and quality label. Socketed items are excluded unless the filter asks
    /// for them; a non-empty category set means "member of at least one".
    pub fn search_vault_items(&self, filter: &VaultItemFilter) -> ReliquaryResult<VaultItemPage> {
        let normalized = filter.normalized(self.config());
        tracing::trace!(
            page = normalized.page,
            page_size = ?normalized.page_size,
            "searching vault items"
        );
        self.store().item_search(&normalized, self.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewVaultItem, VaultEngine};
    use reliquary_core::{
        CanonicalLocation, LocationContext, PresenceState, SortOrder, SourceFileType,
        VaultSortKey,
    };
    use reliquary_storage::MemoryStore;
    use std::sync::Arc;

    fn seeded_engine() -> VaultEngine {
        let engine = VaultEngine::new(Arc::new(MemoryStore::new()));
        let names = [
            ("fp-shako", "Harlequin Crest", "unique"),
            ("fp-torch", "Hellfire Torch", "unique"),
            ("fp-ber", "Ber Rune", "rune"),
            ("fp-jah", "Jah Rune", "rune"),
        ];
        for (fingerprint, name, quality) in names {
            let mut input =
                NewVaultItem::new(fingerprint, name, SourceFileType::CharacterSave);
            input.quality = Some(quality.to_string());
            input.location = CanonicalLocation {
                location_context: LocationContext::Inventory,
                ..Default::default()
            };
            engine.upsert_vault_item_by_fingerprint(input).unwrap();
        }
        engine
    }

    #[test]
    fn test_search_returns_full_page_shape() {
        let engine = seeded_engine();
        let page = engine
            .search_vault_items(&VaultItemFilter::default())
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 25);
        assert_eq!(page.items.len(), 4);
    }

    #[test]
    fn test_search_text_over_quality_and_name() {
        let engine = seeded_engine();
        let runes = engine
            .search_vault_items(&VaultItemFilter {
                text: Some("rune".to_string()),
                sort_key: VaultSortKey::ItemName,
                sort_order: SortOrder::Asc,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(runes.total, 2);
        assert_eq!(runes.items[0].item_name, "Ber Rune");
    }

    #[test]
    fn test_search_presence_after_reconcile() {
        let engine = seeded_engine();
        engine
            .set_vault_items_present(&["fp-ber".to_string()], false, None)
            .unwrap();
        let missing = engine
            .search_vault_items(&VaultItemFilter {
                presence: PresenceState::Missing,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(missing.total, 1);
        assert_eq!(missing.items[0].fingerprint, "fp-ber");
    }

    #[test]
    fn test_search_clamps_rogue_paging() {
        let engine = seeded_engine();
        let page = engine
            .search_vault_items(&VaultItemFilter {
                page: -5,
                page_size: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 4);
    }
}
