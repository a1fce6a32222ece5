//! Reliquary Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod location;

pub use config::VaultConfig;
pub use entities::{ScanReport, ScanScope, VaultCategory, VaultItem, VaultItemCategory};
pub use enums::{
    EntityKind, EquippedSlot, LocationContext, PresenceState, SortOrder, SourceFileType,
    VaultSortKey,
};
pub use error::{ConfigError, ReliquaryError, ReliquaryResult, StorageError, ValidationError};
pub use filter::{VaultItemFilter, VaultItemPage};
pub use location::{
    CanonicalLocation, RawLocationRecord, INVENTORY_GRID_HEIGHT, INVENTORY_GRID_WIDTH,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Storage-surrogate key for a vault item. Defaults to the item's fingerprint
/// on first insert and is stable thereafter, even if later scans would derive
/// a different default.
pub type VaultItemId = String;

/// Stable, content-derived identity key for a physical item instance.
/// Two scans of the same physical item always yield the same fingerprint.
pub type Fingerprint = String;

/// Category identifier using UUIDv7 for timestamp-sortable IDs.
pub type CategoryId = Uuid;

/// Identifier of a character row in the external character table.
pub type CharacterId = Uuid;

/// Slug identifier of an entry in the external grail catalog.
pub type GrailItemId = String;

/// Generate a new UUIDv7 CategoryId (timestamp-sortable).
pub fn new_category_id() -> CategoryId {
    Uuid::now_v7()
}

// ============================================================================
// FINGERPRINTS
// ============================================================================

/// Compute the content fingerprint of a byte payload: SHA-256, lowercase hex.
pub fn compute_fingerprint(content: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Derive a fingerprint from a raw parsed item record.
///
/// `serde_json` serializes object keys in sorted order, so two records with
/// the same fields hash identically regardless of parser field order. Used
/// when a scan record does not carry a precomputed fingerprint.
pub fn fingerprint_for_raw_item(raw: &serde_json::Value) -> Fingerprint {
    compute_fingerprint(raw.to_string().as_bytes())
}

// ============================================================================
// TESTS
// ============================================================================
