//! Vault reconciliation engine
//!
//! Owns upsert-by-fingerprint semantics, scan-based presence reconciliation,
//! and category tagging. Presence is a two-state machine per item: any upsert
//! or scan sighting flips a row present and advances `last_seen_at`; only a
//! reconciliation pass flips rows absent, and doing so leaves `last_seen_at`
//! untouched. Absence never deletes - rows keep their last-known spatial and
//! provenance data until the user unvaults them.

use chrono::Utc;
use reliquary_core::{
    new_category_id, CanonicalLocation, CategoryId, CharacterId, EntityKind, Fingerprint,
    GrailItemId, ReliquaryResult, ScanReport, SourceFileType, StorageError, Timestamp,
    VaultCategory, VaultConfig, VaultItem, VaultItemId,
};
use reliquary_storage::{PresenceUpdate, VaultCategoryUpdate, VaultItemUpdate, VaultStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Input for vaulting one observed item instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVaultItem {
    pub fingerprint: Fingerprint,
    pub item_name: String,
    pub item_code: Option<String>,
    pub quality: Option<String>,
    pub ethereal: bool,
    pub socket_count: Option<i32>,
    pub raw_item_json: Option<serde_json::Value>,
    pub source_character_id: Option<CharacterId>,
    pub source_character_name: Option<String>,
    pub source_file_type: SourceFileType,
    pub location: CanonicalLocation,
    pub is_socketed_item: bool,
    pub icon_file_name: Option<String>,
    pub grail_item_id: Option<GrailItemId>,
    /// Initial tags, applied on insert only. Ingestion never re-tags an
    /// existing row.
    pub category_ids: Vec<CategoryId>,
    /// Timestamp of the scan that observed the item; defaults to now.
    pub seen_at: Option<Timestamp>,
}

impl NewVaultItem {
    /// Minimal input; everything else defaults to empty/None.
    pub fn new(
        fingerprint: impl Into<Fingerprint>,
        item_name: impl Into<String>,
        source_file_type: SourceFileType,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            item_name: item_name.into(),
            item_code: None,
            quality: None,
            ethereal: false,
            socket_count: None,
            raw_item_json: None,
            source_character_id: None,
            source_character_name: None,
            source_file_type,
            location: CanonicalLocation::default(),
            is_socketed_item: false,
            icon_file_name: None,
            grail_item_id: None,
            category_ids: Vec::new(),
            seen_at: None,
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVaultCategory {
    pub name: String,
    pub color: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Scoped rows whose fingerprint appeared in the scan.
    pub marked_present: usize,
    /// Scoped rows newly flipped absent by this pass.
    pub marked_absent: usize,
    /// Fingerprints the scan reported that have no stored row. Normally
    /// empty: callers upsert before reconciling.
    pub unmatched_fingerprints: Vec<Fingerprint>,
}

/// The reconciliation engine. All mutations flow through the storage port;
/// multi-row updates ride the port's transactional bulk operations.
pub struct VaultEngine {
    store: Arc<dyn VaultStore>,
    config: VaultConfig,
}

impl VaultEngine {
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self {
            store,
            config: VaultConfig::default(),
        }
    }

    pub fn with_config(store: Arc<dyn VaultStore>, config: VaultConfig) -> ReliquaryResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub(crate) fn store(&self) -> &dyn VaultStore {
        self.store.as_ref()
    }

    pub(crate) fn config(&self) -> &VaultConfig {
        &self.config
    }

    // === Item Operations ===

    /// Vault a first sighting. Fails with `DuplicateFingerprint` if the
    /// fingerprint already exists - rescans go through
    /// `upsert_vault_item_by_fingerprint`.
    pub fn add_vault_item(&self, input: NewVaultItem) -> ReliquaryResult<VaultItem> {
        let item = build_item(input, Utc::now());
        self.store.item_insert(&item)?;
        tracing::debug!(fingerprint = %item.fingerprint, "vaulted new item");
        self.readback_item(&item.vault_item_id)
    }

    /// Primary ingestion entry point: insert-or-update keyed on fingerprint.
    ///
    /// On conflict every mutable descriptive/location/provenance field is
    /// overwritten with the new scan's values while the original surrogate
    /// id, `created`, `vaulted_at`, and category memberships are preserved.
    /// The row comes back present with `last_seen_at` advanced. Idempotent:
    /// re-applying the same input yields the same stored state.
    pub fn upsert_vault_item_by_fingerprint(
        &self,
        input: NewVaultItem,
    ) -> ReliquaryResult<VaultItem> {
        let now = Utc::now();
        match self.store.item_get_by_fingerprint(&input.fingerprint)? {
            None => {
                let item = build_item(input, now);
                self.store.item_insert(&item)?;
                tracing::debug!(fingerprint = %item.fingerprint, "vaulted new item via upsert");
                self.readback_item(&item.vault_item_id)
            }
            Some(existing) => {
                let mut row = build_item(input, now);
                row.vault_item_id = existing.vault_item_id.clone();
                row.created = existing.created;
                row.vaulted_at = existing.vaulted_at;
                row.unvaulted_at = existing.unvaulted_at;
                row.category_ids = Vec::new();
                self.store.item_replace(&row)?;
                tracing::debug!(fingerprint = %row.fingerprint, "refreshed vaulted item");
                self.readback_item(&row.vault_item_id)
            }
        }
    }

    /// Explicit partial mutation for manual user edits. A `categories` field
    /// replaces the full membership set, it does not merge.
    pub fn update_vault_item(
        &self,
        id: &str,
        update: VaultItemUpdate,
    ) -> ReliquaryResult<VaultItem> {
        self.store.item_update(id, update)?;
        self.readback_item(id)
    }

    /// Unvault: hard delete, cascading category memberships.
    pub fn remove_vault_item(&self, id: &str) -> ReliquaryResult<()> {
        self.store.item_delete(id)?;
        tracing::info!(vault_item_id = %id, "unvaulted item");
        Ok(())
    }

    // === Reconciliation ===

    /// Reconcile presence for every stored row inside the scan's scope, in
    /// one transaction. Rows whose fingerprint appeared in the scan are
    /// marked present with `last_seen_at` advanced to the scan timestamp;
    /// the rest are marked absent with `last_seen_at` untouched. Rows
    /// outside the scope are never affected. An empty scope is a normal
    /// empty result.
    pub fn reconcile_vault_items_for_scan(
        &self,
        scan: &ScanReport,
    ) -> ReliquaryResult<ReconcileSummary> {
        let scoped = self.store.item_list_by_scope(&scan.scope)?;
        let mut scoped_fingerprints: HashSet<&str> = HashSet::with_capacity(scoped.len());
        let mut updates = Vec::with_capacity(scoped.len());
        let mut marked_present = 0;
        let mut marked_absent = 0;

        for item in &scoped {
            scoped_fingerprints.insert(item.fingerprint.as_str());
            if scan.present_fingerprints.contains(&item.fingerprint) {
                marked_present += 1;
                updates.push(PresenceUpdate {
                    vault_item_id: item.vault_item_id.clone(),
                    present: true,
                    seen_at: Some(scan.scanned_at),
                });
            } else {
                if item.is_present_in_latest_scan {
                    marked_absent += 1;
                }
                updates.push(PresenceUpdate {
                    vault_item_id: item.vault_item_id.clone(),
                    present: false,
                    seen_at: None,
                });
            }
        }
        self.store.item_set_presence_bulk(&updates)?;

        let mut unmatched_fingerprints: Vec<Fingerprint> = scan
            .present_fingerprints
            .iter()
            .filter(|fingerprint| !scoped_fingerprints.contains(fingerprint.as_str()))
            .cloned()
            .collect();
        unmatched_fingerprints.sort();

        tracing::info!(
            source_file_type = %scan.scope.source_file_type,
            marked_present,
            marked_absent,
            unmatched = unmatched_fingerprints.len(),
            "reconciled scan"
        );
        Ok(ReconcileSummary {
            marked_present,
            marked_absent,
            unmatched_fingerprints,
        })
    }

    /// Per-fingerprint presence toggle outside a full reconciliation pass.
    /// Unknown fingerprints are skipped, not errors. Returns the number of
    /// rows updated. Marking present advances `last_seen_at` when `seen_at`
    /// is given; marking absent never touches it.
    pub fn set_vault_items_present(
        &self,
        fingerprints: &[Fingerprint],
        present: bool,
        seen_at: Option<Timestamp>,
    ) -> ReliquaryResult<usize> {
        let mut updates = Vec::with_capacity(fingerprints.len());
        for fingerprint in fingerprints {
            match self.store.item_get_by_fingerprint(fingerprint)? {
                Some(item) => updates.push(PresenceUpdate {
                    vault_item_id: item.vault_item_id,
                    present,
                    seen_at: if present { seen_at } else { None },
                }),
                None => {
                    tracing::debug!(fingerprint = %fingerprint, "presence toggle skipped unknown fingerprint");
                }
            }
        }
        self.store.item_set_presence_bulk(&updates)?;
        Ok(updates.len())
    }

    // === Category Operations ===

    pub fn add_vault_category(&self, input: NewVaultCategory) -> ReliquaryResult<VaultCategory> {
        let now = Utc::now();
        let category = VaultCategory {
            category_id: new_category_id(),
            name: input.name,
            color: input.color,
            metadata: input.metadata,
            created: now,
            last_updated: now,
        };
        self.store.category_insert(&category)?;
        tracing::debug!(category = %category.name, "created category");
        Ok(category)
    }

    pub fn update_vault_category(
        &self,
        id: CategoryId,
        update: VaultCategoryUpdate,
    ) -> ReliquaryResult<VaultCategory> {
        self.store.category_update(id, update)?;
        self.store.category_get(id)?.ok_or_else(|| {
            StorageError::ReadbackFailed {
                entity: EntityKind::VaultCategory,
                id: id.to_string(),
            }
            .into()
        })
    }

    pub fn remove_vault_category(&self, id: CategoryId) -> ReliquaryResult<()> {
        self.store.category_delete(id)?;
        tracing::info!(category_id = %id, "removed category");
        Ok(())
    }

    pub fn list_vault_categories(&self) -> ReliquaryResult<Vec<VaultCategory>> {
        self.store.category_list()
    }

    /// Replace an item's full membership set. Duplicates in the target set
    /// collapse; applying the same set twice is a no-op.
    pub fn set_vault_item_categories(
        &self,
        item_id: &VaultItemId,
        categories: &[CategoryId],
    ) -> ReliquaryResult<VaultItem> {
        self.store.set_item_categories(item_id, categories)?;
        self.readback_item(item_id)
    }

    // === Internal ===

    /// Re-read a row written by this operation. Failure here is a storage
    /// contract violation, distinct from a normal not-found.
    fn readback_item(&self, id: &str) -> ReliquaryResult<VaultItem> {
        self.store.item_get(id)?.ok_or_else(|| {
            StorageError::ReadbackFailed {
                entity: EntityKind::VaultItem,
                id: id.to_string(),
            }
            .into()
        })
    }
}

/// Materialize input into a fresh row: id defaults to the fingerprint, the
/// row starts present, and `last_seen_at` is the scan timestamp.
fn build_item(input: NewVaultItem, now: Timestamp) -> VaultItem {
    let seen_at = input.seen_at.unwrap_or(now);
    let category_ids: Vec<CategoryId> = input
        .category_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut item = VaultItem {
        vault_item_id: input.fingerprint.clone(),
        fingerprint: input.fingerprint,
        item_name: input.item_name,
        item_code: input.item_code,
        quality: input.quality,
        ethereal: input.ethereal,
        socket_count: input.socket_count,
        raw_item_json: input.raw_item_json,
        source_character_id: input.source_character_id,
        source_character_name: input.source_character_name,
        source_file_type: input.source_file_type,
        location_context: Default::default(),
        stash_tab: None,
        grid_x: None,
        grid_y: None,
        grid_width: None,
        grid_height: None,
        equipped_slot_id: None,
        is_socketed_item: input.is_socketed_item,
        icon_file_name: input.icon_file_name,
        grail_item_id: input.grail_item_id,
        is_present_in_latest_scan: true,
        last_seen_at: Some(seen_at),
        vaulted_at: Some(now),
        unvaulted_at: None,
        created: now,
        last_updated: now,
        category_ids,
    };
    item.set_location(&input.location);
    item
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use reliquary_core::ScanScope;
    use reliquary_storage::MemoryStore;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// After reconciliation, presence equals membership in the scan's
        /// present-set for every scoped row.
        #[test]
        fn prop_presence_matches_scan_set(
            stored in proptest::collection::hash_set("fp-[a-d]{1,3}", 0..12),
            present in proptest::collection::hash_set("fp-[a-d]{1,3}", 0..12),
        ) {
            let engine = VaultEngine::new(Arc::new(MemoryStore::new()));
            for fingerprint in &stored {
                engine
                    .upsert_vault_item_by_fingerprint(NewVaultItem::new(
                        fingerprint.clone(),
                        "Test Item",
                        SourceFileType::CharacterSave,
                    ))
                    .unwrap();
            }
            let report = ScanReport {
                scope: ScanScope {
                    source_file_type: SourceFileType::CharacterSave,
                    source_character_id: None,
                },
                present_fingerprints: present.clone(),
                scanned_at: Utc::now(),
            };
            engine.reconcile_vault_items_for_scan(&report).unwrap();

            for fingerprint in &stored {
                let row = engine
                    .store()
                    .item_get_by_fingerprint(fingerprint)
                    .unwrap()
                    .unwrap();
                prop_assert_eq!(
                    row.is_present_in_latest_scan,
                    present.contains(fingerprint)
                );
            }
        }

        /// Upserting the same fingerprint any number of times leaves exactly
        /// one stored row.
        #[test]
        fn prop_upsert_never_duplicates(times in 1usize..6) {
            let store = Arc::new(MemoryStore::new());
            let engine = VaultEngine::new(store.clone());
            for _ in 0..times {
                engine
                    .upsert_vault_item_by_fingerprint(NewVaultItem::new(
                        "fp-1",
                        "Test Item",
                        SourceFileType::CharacterSave,
                    ))
                    .unwrap();
            }
            prop_assert_eq!(store.item_count(), 1);
        }

        /// Reconciliation reports unmatched fingerprints exactly: those in
        /// the scan with no stored row.
        #[test]
        fn prop_unmatched_is_exact(
            stored in proptest::collection::hash_set("fp-[a-b]{1,2}", 0..6),
            present in proptest::collection::hash_set("fp-[a-b]{1,2}", 0..6),
        ) {
            let engine = VaultEngine::new(Arc::new(MemoryStore::new()));
            for fingerprint in &stored {
                engine
                    .upsert_vault_item_by_fingerprint(NewVaultItem::new(
                        fingerprint.clone(),
                        "Test Item",
                        SourceFileType::CharacterSave,
                    ))
                    .unwrap();
            }
            let report = ScanReport {
                scope: ScanScope {
                    source_file_type: SourceFileType::CharacterSave,
                    source_character_id: None,
                },
                present_fingerprints: present.clone(),
                scanned_at: Utc::now(),
            };
            let summary = engine.reconcile_vault_items_for_scan(&report).unwrap();
            let expected: HashSet<String> =
                present.difference(&stored).cloned().collect();
            let actual: HashSet<String> =
                summary.unmatched_fingerprints.into_iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
