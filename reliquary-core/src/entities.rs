//! Core entity structures

use crate::enums::{LocationContext, SourceFileType};
use crate::error::{ReliquaryResult, ValidationError};
use crate::location::CanonicalLocation;
use crate::{CategoryId, CharacterId, Fingerprint, GrailItemId, Timestamp, VaultItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// VaultItem - a persisted snapshot of one physical item instance observed in
/// a save file.
///
/// The `fingerprint` is the true identity key; `vault_item_id` is a storage
/// surrogate that defaults to the fingerprint on first insert and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItem {
    pub vault_item_id: VaultItemId,
    pub fingerprint: Fingerprint,

    // Descriptive
    pub item_name: String,
    pub item_code: Option<String>,
    /// Free-form quality label handed to us by the parser (e.g. "unique").
    pub quality: Option<String>,
    pub ethereal: bool,
    pub socket_count: Option<i32>,
    /// Opaque full parser record, retained for re-derivation and tooltips.
    pub raw_item_json: Option<serde_json::Value>,

    // Provenance
    pub source_character_id: Option<CharacterId>,
    /// Denormalized display cache; survives character deletion.
    pub source_character_name: Option<String>,
    pub source_file_type: SourceFileType,

    // Location
    pub location_context: LocationContext,
    pub stash_tab: Option<i32>,
    pub grid_x: Option<i32>,
    pub grid_y: Option<i32>,
    pub grid_width: Option<i32>,
    pub grid_height: Option<i32>,
    pub equipped_slot_id: Option<i32>,
    pub is_socketed_item: bool,

    // Presentation
    pub icon_file_name: Option<String>,

    // Grail linkage (nulled, not cascaded, if the catalog entry is removed)
    pub grail_item_id: Option<GrailItemId>,

    // Lifecycle
    pub is_present_in_latest_scan: bool,
    pub last_seen_at: Option<Timestamp>,
    pub vaulted_at: Option<Timestamp>,
    pub unvaulted_at: Option<Timestamp>,
    pub created: Timestamp,
    pub last_updated: Timestamp,

    /// Hydrated category memberships, always resolved on read.
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl VaultItem {
    /// The item's spatial placement as a canonical location tuple.
    pub fn location(&self) -> CanonicalLocation {
        CanonicalLocation {
            location_context: self.location_context,
            stash_tab: self.stash_tab,
            grid_x: self.grid_x,
            grid_y: self.grid_y,
            grid_width: self.grid_width,
            grid_height: self.grid_height,
            equipped_slot_id: self.equipped_slot_id,
        }
    }

    /// Overwrite all positional columns from a canonical location tuple.
    pub fn set_location(&mut self, location: &CanonicalLocation) {
        self.location_context = location.location_context;
        self.stash_tab = location.stash_tab;
        self.grid_x = location.grid_x;
        self.grid_y = location.grid_y;
        self.grid_width = location.grid_width;
        self.grid_height = location.grid_height;
        self.equipped_slot_id = location.equipped_slot_id;
    }

    /// Check row invariants before a write.
    pub fn validate(&self) -> ReliquaryResult<()> {
        if self.fingerprint.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "fingerprint".to_string(),
            }
            .into());
        }
        if self.vault_item_id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "vault_item_id".to_string(),
            }
            .into());
        }
        if self.item_name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "item_name".to_string(),
            }
            .into());
        }
        self.location().validate()
    }
}

/// VaultCategory - user-defined tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultCategory {
    pub category_id: CategoryId,
    /// Unique across all categories.
    pub name: String,
    pub color: Option<String>,
    /// Opaque UI payload (ordering hints, emoji, whatever the UI stores).
    pub metadata: Option<serde_json::Value>,
    pub created: Timestamp,
    pub last_updated: Timestamp,
}

impl VaultCategory {
    pub fn validate(&self) -> ReliquaryResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Join row between a vault item and a category. Membership is idempotent:
/// the (item, category) pair never duplicates. Ordered by (item, category)
/// so membership sets iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VaultItemCategory {
    pub vault_item_id: VaultItemId,
    pub category_id: CategoryId,
}

/// The slice of stored rows a scan is allowed to touch: same source file
/// type, and same source character when the scan is character-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanScope {
    pub source_file_type: SourceFileType,
    pub source_character_id: Option<CharacterId>,
}

impl ScanScope {
    /// Whether a stored row falls inside this scope.
    pub fn matches(&self, item: &VaultItem) -> bool {
        if item.source_file_type != self.source_file_type {
            return false;
        }
        match self.source_character_id {
            Some(character_id) => item.source_character_id == Some(character_id),
            None => true,
        }
    }
}

/// One pass of the save-file parser over a given source, reduced to the set
/// of fingerprints currently present there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scope: ScanScope,
    pub present_fingerprints: HashSet<Fingerprint>,
    pub scanned_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_item(fingerprint: &str) -> VaultItem {
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
            icon_file_name: None,
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

    #[test]
    fn test_location_round_trip() {
        let mut item = make_item("fp-1");
        let loc = CanonicalLocation {
            location_context: LocationContext::Stash,
            stash_tab: Some(3),
            grid_x: Some(4),
            grid_y: Some(1),
            grid_width: Some(1),
            grid_height: Some(3),
            equipped_slot_id: None,
        };
        item.set_location(&loc);
        assert_eq!(item.location(), loc);
        assert_eq!(item.stash_tab, Some(3));
    }

    #[test]
    fn test_validate_rejects_empty_fingerprint() {
        let mut item = make_item("fp-1");
        item.fingerprint = "  ".to_string();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_validate_enforces_stash_tab_invariant() {
        let mut item = make_item("fp-1");
        item.stash_tab = Some(1);
        assert!(item.validate().is_err());
        item.location_context = LocationContext::Stash;
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_scope_matches_by_file_type() {
        let item = make_item("fp-1");
        let scope = ScanScope {
            source_file_type: SourceFileType::CharacterSave,
            source_character_id: None,
        };
        assert!(scope.matches(&item));

        let other = ScanScope {
            source_file_type: SourceFileType::SharedStash,
            source_character_id: None,
        };
        assert!(!other.matches(&item));
    }

    #[test]
    fn test_character_scoped_scan_excludes_other_characters() {
        let character = Uuid::now_v7();
        let mut item = make_item("fp-1");
        item.source_character_id = Some(character);

        let scope = ScanScope {
            source_file_type: SourceFileType::CharacterSave,
            source_character_id: Some(character),
        };
        assert!(scope.matches(&item));

        let other_scope = ScanScope {
            source_file_type: SourceFileType::CharacterSave,
            source_character_id: Some(Uuid::now_v7()),
        };
        assert!(!other_scope.matches(&item));

        // Unowned rows are outside any character-scoped scan
        item.source_character_id = None;
        assert!(!scope.matches(&item));
    }
}
