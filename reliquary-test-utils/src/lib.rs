//! Reliquary Test Utilities
//!
//! Centralized test infrastructure for the Reliquary workspace:
//! - Fixture builders for vault items, categories, and scan reports
//! - Proptest generators for entity types
//!
//! Intended for dev-dependencies only; nothing here ships in the app.

// Re-export the in-memory store so test crates don't need a direct
// reliquary-storage dependency.
pub use reliquary_storage::MemoryStore;

pub use reliquary_core::{
    new_category_id, CanonicalLocation, CategoryId, CharacterId, Fingerprint, LocationContext,
    ScanReport, ScanScope, SourceFileType, Timestamp, VaultCategory, VaultItem, VaultItemId,
};

use chrono::Utc;
use std::collections::HashSet;

// ============================================================================
// FIXTURES
// ============================================================================

/// A present, non-socketed inventory item with the id defaulted to the
/// fingerprint, the way first-sighting ingestion creates rows.
pub fn make_test_item(fingerprint: &str) -> VaultItem {
    let now = Utc::now();
    VaultItem {
        vault_item_id: fingerprint.to_string(),
        fingerprint: fingerprint.to_string(),
        item_name: "Harlequin Crest".to_string(),
        item_code: Some("uap".to_string()),
        quality: Some("unique".to_string()),
        ethereal: false,
        socket_count: None,
        raw_item_json: None,
        source_character_id: None,
        source_character_name: None,
        source_file_type: SourceFileType::CharacterSave,
        location_context: LocationContext::Inventory,
        stash_tab: None,
        grid_x: Some(0),
        grid_y: Some(0),
        grid_width: Some(2),
        grid_height: Some(2),
        equipped_slot_id: None,
        is_socketed_item: false,
        icon_file_name: Some("harlequin_crest.png".to_string()),
        grail_item_id: None,
        is_present_in_latest_scan: true,
        last_seen_at: Some(now),
        vaulted_at: Some(now),
        unvaulted_at: None,
        created: now,
        last_updated: now,
        category_ids: Vec::new(),
    }
}

/// A stash-context item on the given tab and coordinates.
pub fn make_stash_item(fingerprint: &str, tab: i32, x: i32, y: i32) -> VaultItem {
    let mut item = make_test_item(fingerprint);
    item.location_context = LocationContext::Stash;
    item.stash_tab = Some(tab);
    item.grid_x = Some(x);
    item.grid_y = Some(y);
    item
}

/// A category with a fresh UUIDv7 id.
pub fn make_test_category(name: &str) -> VaultCategory {
    let now = Utc::now();
    VaultCategory {
        category_id: new_category_id(),
        name: name.to_string(),
        color: None,
        metadata: None,
        created: now,
        last_updated: now,
    }
}

/// A character-save-scoped scan report over the given present fingerprints.
pub fn make_scan_report(
    source_character_id: Option<CharacterId>,
    present: &[&str],
) -> ScanReport {
    ScanReport {
        scope: ScanScope {
            source_file_type: SourceFileType::CharacterSave,
            source_character_id,
        },
        present_fingerprints: present
            .iter()
            .map(|fingerprint| fingerprint.to_string())
            .collect::<HashSet<Fingerprint>>(),
        scanned_at: Utc::now(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Proptest strategies for Reliquary entity types.
pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_fingerprint() -> impl Strategy<Value = Fingerprint> {
        proptest::string::string_regex("[a-f0-9]{16}").unwrap()
    }

    pub fn arb_category_id() -> impl Strategy<Value = CategoryId> {
        any::<u128>().prop_map(uuid::Uuid::from_u128)
    }

    pub fn arb_location_context() -> impl Strategy<Value = LocationContext> {
        prop_oneof![
            Just(LocationContext::Equipped),
            Just(LocationContext::Inventory),
            Just(LocationContext::Stash),
            Just(LocationContext::Mercenary),
            Just(LocationContext::Corpse),
            Just(LocationContext::Unknown),
        ]
    }

    pub fn arb_source_file_type() -> impl Strategy<Value = SourceFileType> {
        prop_oneof![
            Just(SourceFileType::CharacterSave),
            Just(SourceFileType::SharedStash),
            Just(SourceFileType::PlugySharedStash),
            Just(SourceFileType::PlugyPersonalStash),
        ]
    }

    /// A structurally valid vault item: stash tab only under stash context,
    /// id equal to fingerprint.
    pub fn arb_vault_item() -> impl Strategy<Value = VaultItem> {
        (
            arb_fingerprint(),
            "[A-Z][a-z]{2,12}",
            arb_source_file_type(),
            arb_location_context(),
            0i32..16,
            proptest::bool::ANY,
        )
            .prop_map(
                |(fingerprint, name, source_file_type, location_context, tab, present)| {
                    let mut item = make_test_item(&fingerprint);
                    item.item_name = name;
                    item.source_file_type = source_file_type;
                    item.location_context = location_context;
                    item.stash_tab = if location_context == LocationContext::Stash {
                        Some(tab)
                    } else {
                        None
                    };
                    item.is_present_in_latest_scan = present;
                    item
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixtures_are_valid() {
        assert!(make_test_item("fp-1").validate().is_ok());
        assert!(make_stash_item("fp-2", 3, 1, 1).validate().is_ok());
        assert!(make_test_category("runes").validate().is_ok());
    }

    #[test]
    fn test_scan_report_collects_fingerprints() {
        let report = make_scan_report(None, &["fp-1", "fp-2", "fp-1"]);
        assert_eq!(report.present_fingerprints.len(), 2);
    }

    proptest! {
        /// Every generated item passes entity validation.
        #[test]
        fn prop_generated_items_are_valid(item in generators::arb_vault_item()) {
            prop_assert!(item.validate().is_ok());
        }
    }
}
