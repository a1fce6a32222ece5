//! Spatial location resolver
//!
//! Converts raw save-format location signals into the canonical
//! `CanonicalLocation` tuple. Pure and total: any well-formed input resolves
//! to something, falling back to the caller-supplied location when the raw
//! record yields no actionable signal.

use reliquary_core::location::{
    CanonicalLocation, RawLocationRecord, INVENTORY_GRID_HEIGHT, INVENTORY_GRID_WIDTH,
    RAW_ALT_CUBE, RAW_ALT_INVENTORY, RAW_ALT_STASH, RAW_LOCATION_BELT, RAW_LOCATION_CURSOR,
    RAW_LOCATION_EQUIPPED, RAW_LOCATION_SOCKETED, RAW_LOCATION_STORED,
};
use reliquary_core::{LocationContext, SourceFileType};

/// Resolve a raw location record to its canonical form.
///
/// `fallback_location` (and `fallback_stash_tab`, honored only when the
/// fallback is stash) is returned unchanged when the record carries no
/// actionable signal: cursor items, socketed items, and unrecognized codes.
/// For stash sources the tab always comes from `fallback_stash_tab` - the
/// parser knows which tab page it is reading, the item record does not.
pub fn resolve_spatial_location(
    raw: &RawLocationRecord,
    source_file_type: SourceFileType,
    fallback_location: LocationContext,
    fallback_stash_tab: Option<i32>,
) -> CanonicalLocation {
    match raw.location_code {
        Some(code) if code == RAW_LOCATION_EQUIPPED => CanonicalLocation {
            location_context: LocationContext::Equipped,
            stash_tab: None,
            grid_x: None,
            grid_y: None,
            grid_width: raw.inv_width,
            grid_height: raw.inv_height,
            equipped_slot_id: raw.equipped_code,
        },
        // Belt is a pseudo-location: the raw x is the belt column and there
        // is no row. Bypasses grid normalization entirely.
        Some(code) if code == RAW_LOCATION_BELT => CanonicalLocation {
            location_context: LocationContext::Inventory,
            stash_tab: None,
            grid_x: raw.position_x,
            grid_y: Some(0),
            grid_width: raw.inv_width,
            grid_height: raw.inv_height,
            equipped_slot_id: None,
        },
        Some(code) if code == RAW_LOCATION_STORED => {
            resolve_stored(raw, source_file_type, fallback_location, fallback_stash_tab)
        }
        // A socketed item has no location of its own; it rides in its host.
        // A cursor item is mid-move and equally placeless.
        Some(code) if code == RAW_LOCATION_SOCKETED || code == RAW_LOCATION_CURSOR => {
            fallback(raw, fallback_location, fallback_stash_tab)
        }
        // Absent or unrecognized: no actionable signal.
        _ => fallback(raw, fallback_location, fallback_stash_tab),
    }
}

/// Dispatch a "stored" item to inventory, cube, or stash.
///
/// The three stash file formats are stash pages through and through; their
/// alt-position codes are not trustworthy and everything stored in them is
/// stash. Only the character save honors the alt-code dispatch.
fn resolve_stored(
    raw: &RawLocationRecord,
    source_file_type: SourceFileType,
    fallback_location: LocationContext,
    fallback_stash_tab: Option<i32>,
) -> CanonicalLocation {
    if source_file_type != SourceFileType::CharacterSave {
        return stash(raw, fallback_stash_tab);
    }
    match raw.alt_position_code {
        // Cube contents share the inventory path; cube coordinates are
        // always inside the 10x4 bounds so the clamp is a no-op there.
        Some(alt) if alt == RAW_ALT_INVENTORY || alt == RAW_ALT_CUBE => CanonicalLocation {
            location_context: LocationContext::Inventory,
            stash_tab: None,
            grid_x: raw.position_x.map(clamp_inventory_x),
            grid_y: raw.position_y.map(clamp_inventory_y),
            grid_width: raw.inv_width,
            grid_height: raw.inv_height,
            equipped_slot_id: None,
        },
        Some(alt) if alt == RAW_ALT_STASH => stash(raw, fallback_stash_tab),
        _ => fallback(raw, fallback_location, fallback_stash_tab),
    }
}

/// Stash coordinates are never subjected to inventory-bounds normalization,
/// even when numerically identical to an inventory case.
fn stash(raw: &RawLocationRecord, stash_tab: Option<i32>) -> CanonicalLocation {
    CanonicalLocation {
        location_context: LocationContext::Stash,
        stash_tab,
        grid_x: raw.position_x,
        grid_y: raw.position_y,
        grid_width: raw.inv_width,
        grid_height: raw.inv_height,
        equipped_slot_id: None,
    }
}

fn fallback(
    raw: &RawLocationRecord,
    fallback_location: LocationContext,
    fallback_stash_tab: Option<i32>,
) -> CanonicalLocation {
    CanonicalLocation {
        location_context: fallback_location,
        stash_tab: if fallback_location == LocationContext::Stash {
            fallback_stash_tab
        } else {
            None
        },
        grid_x: raw.position_x,
        grid_y: raw.position_y,
        grid_width: raw.inv_width,
        grid_height: raw.inv_height,
        equipped_slot_id: None,
    }
}

// Certain save formats emit inventory coordinates exactly one column or one
// row past the 10x4 grid. The clamp pulls exactly that case back in; anything
// further out is passed through unchanged so genuinely corrupt coordinates
// stay visible instead of being silently rewritten.
fn clamp_inventory_x(x: i32) -> i32 {
    if x == INVENTORY_GRID_WIDTH {
        INVENTORY_GRID_WIDTH - 1
    } else {
        x
    }
}

fn clamp_inventory_y(y: i32) -> i32 {
    if y == INVENTORY_GRID_HEIGHT {
        INVENTORY_GRID_HEIGHT - 1
    } else {
        y
    }
}
