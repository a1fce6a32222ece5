//! Canonical location model and raw save-format location signals

use crate::enums::{EquippedSlot, LocationContext};
use crate::error::{ReliquaryResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Width of the canonical character inventory grid, in columns.
pub const INVENTORY_GRID_WIDTH: i32 = 10;

/// Height of the canonical character inventory grid, in rows.
pub const INVENTORY_GRID_HEIGHT: i32 = 4;

// Raw location codes from the binary save layout.
/// Item sits in a storage grid; the alt-position code says which one.
pub const RAW_LOCATION_STORED: i32 = 0;
/// Item is worn on the paper doll.
pub const RAW_LOCATION_EQUIPPED: i32 = 1;
/// Item sits in a belt column.
pub const RAW_LOCATION_BELT: i32 = 2;
/// Item is attached to the mouse cursor mid-move.
pub const RAW_LOCATION_CURSOR: i32 = 4;
/// Item is socketed into a host item.
pub const RAW_LOCATION_SOCKETED: i32 = 6;

// Alt-position codes for RAW_LOCATION_STORED.
pub const RAW_ALT_INVENTORY: i32 = 1;
pub const RAW_ALT_CUBE: i32 = 4;
pub const RAW_ALT_STASH: i32 = 5;

/// Normalized location tuple used uniformly regardless of source save format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalLocation {
    pub location_context: LocationContext,
    /// Only meaningful when `location_context` is `Stash`.
    pub stash_tab: Option<i32>,
    pub grid_x: Option<i32>,
    pub grid_y: Option<i32>,
    pub grid_width: Option<i32>,
    pub grid_height: Option<i32>,
    pub equipped_slot_id: Option<i32>,
}

impl CanonicalLocation {
    /// Check the context/tab invariant: `stash_tab` must be null unless the
    /// context is `Stash`.
    pub fn validate(&self) -> ReliquaryResult<()> {
        if self.stash_tab.is_some() && self.location_context != LocationContext::Stash {
            return Err(ValidationError::ConstraintViolation {
                constraint: "stash_tab".to_string(),
                reason: format!(
                    "stash_tab is only meaningful for stash items, context is {}",
                    self.location_context
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Decode the raw equipped-slot id, when it maps to a known slot.
    /// Unknown ids stay available through `equipped_slot_id` for display.
    pub fn equipped_slot(&self) -> Option<EquippedSlot> {
        self.equipped_slot_id.and_then(EquippedSlot::from_code)
    }
}

/// Raw location signals as supplied by the save-file parser, before any
/// normalization. All fields are optional: corrupt or truncated records
/// simply yield fewer signals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLocationRecord {
    pub location_code: Option<i32>,
    pub alt_position_code: Option<i32>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub inv_width: Option<i32>,
    pub inv_height: Option<i32>,
    pub equipped_code: Option<i32>,
}

impl RawLocationRecord {
    /// Extract location signals from a raw parsed item record.
    ///
    /// Never fails: missing keys, wrong types, or a non-object payload all
    /// degrade to `None` fields.
    pub fn from_raw_json(raw: &serde_json::Value) -> RawLocationRecord {
        RawLocationRecord {
            location_code: int_field(raw, "location_id"),
            alt_position_code: int_field(raw, "alt_position_id"),
            position_x: int_field(raw, "position_x"),
            position_y: int_field(raw, "position_y"),
            inv_width: int_field(raw, "inv_width"),
            inv_height: int_field(raw, "inv_height"),
            equipped_code: int_field(raw, "equipped_id"),
        }
    }
}

fn int_field(raw: &serde_json::Value, key: &str) -> Option<i32> {
    raw.get(key)
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
}
