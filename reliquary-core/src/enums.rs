//! Enum types for Reliquary entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Where an item physically sits within a save file, normalized across
/// source formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationContext {
    /// Worn by the character
    Equipped,
    /// Character inventory grid (includes belt and cube contents)
    Inventory,
    /// A stash tab grid
    Stash,
    /// Carried by the hired mercenary
    Mercenary,
    /// On the character's corpse
    Corpse,
    /// No usable location signal was recovered
    #[default]
    Unknown,
}

/// Kind of save file a scan was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFileType {
    /// Primary character save (.d2s)
    CharacterSave,
    /// Shared stash file (.d2i)
    SharedStash,
    /// Legacy PlugY shared stash (.sss)
    PlugySharedStash,
    /// Legacy PlugY personal stash (.d2x)
    PlugyPersonalStash,
}

/// Equipped-slot codes from the save format's paper-doll layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquippedSlot {
    Head,
    Neck,
    Torso,
    RightHand,
    LeftHand,
    RightRing,
    LeftRing,
    Belt,
    Feet,
    Gloves,
    SwapRightHand,
    SwapLeftHand,
}

impl EquippedSlot {
    /// Decode a raw save-format equipped-slot code.
    /// Unknown codes return `None`; callers keep the raw id in that case.
    pub fn from_code(code: i32) -> Option<EquippedSlot> {
        match code {
            1 => Some(EquippedSlot::Head),
            2 => Some(EquippedSlot::Neck),
            3 => Some(EquippedSlot::Torso),
            4 => Some(EquippedSlot::RightHand),
            5 => Some(EquippedSlot::LeftHand),
            6 => Some(EquippedSlot::RightRing),
            7 => Some(EquippedSlot::LeftRing),
            8 => Some(EquippedSlot::Belt),
            9 => Some(EquippedSlot::Feet),
            10 => Some(EquippedSlot::Gloves),
            11 => Some(EquippedSlot::SwapRightHand),
            12 => Some(EquippedSlot::SwapLeftHand),
            _ => None,
        }
    }

    /// The raw save-format code for this slot.
    pub fn code(&self) -> i32 {
        match self {
            EquippedSlot::Head => 1,
            EquippedSlot::Neck => 2,
            EquippedSlot::Torso => 3,
            EquippedSlot::RightHand => 4,
            EquippedSlot::LeftHand => 5,
            EquippedSlot::RightRing => 6,
            EquippedSlot::LeftRing => 7,
            EquippedSlot::Belt => 8,
            EquippedSlot::Feet => 9,
            EquippedSlot::Gloves => 10,
            EquippedSlot::SwapRightHand => 11,
            EquippedSlot::SwapLeftHand => 12,
        }
    }
}

/// Presence filter for vault searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// Both present and missing items
    #[default]
    All,
    /// Only items seen in the latest scan of their source
    Present,
    /// Only items that dropped out of their source
    Missing,
}

/// Sort key for vault searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultSortKey {
    ItemName,
    #[default]
    LastSeen,
    Created,
    Updated,
}

/// Sort direction for vault searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Entity discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    VaultItem,
    VaultCategory,
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

/// Normalize a token for case/spacing-insensitive parsing.
fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for LocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            LocationContext::Equipped => "equipped",
            LocationContext::Inventory => "inventory",
            LocationContext::Stash => "stash",
            LocationContext::Mercenary => "mercenary",
            LocationContext::Corpse => "corpse",
            LocationContext::Unknown => "unknown",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for LocationContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "equipped" => Ok(LocationContext::Equipped),
            "inventory" => Ok(LocationContext::Inventory),
            "stash" => Ok(LocationContext::Stash),
            "mercenary" | "merc" => Ok(LocationContext::Mercenary),
            "corpse" => Ok(LocationContext::Corpse),
            "unknown" => Ok(LocationContext::Unknown),
            _ => Err(format!("Invalid LocationContext: {}", s)),
        }
    }
}

impl fmt::Display for SourceFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SourceFileType::CharacterSave => "character_save",
            SourceFileType::SharedStash => "shared_stash",
            SourceFileType::PlugySharedStash => "plugy_shared_stash",
            SourceFileType::PlugyPersonalStash => "plugy_personal_stash",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for SourceFileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "charactersave" | "d2s" => Ok(SourceFileType::CharacterSave),
            "sharedstash" | "d2i" => Ok(SourceFileType::SharedStash),
            "plugysharedstash" | "sss" => Ok(SourceFileType::PlugySharedStash),
            "plugypersonalstash" | "d2x" => Ok(SourceFileType::PlugyPersonalStash),
            _ => Err(format!("Invalid SourceFileType: {}", s)),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityKind::VaultItem => "VaultItem",
            EntityKind::VaultCategory => "VaultCategory",
        };
        write!(f, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_context_default_is_unknown() {
        assert_eq!(LocationContext::default(), LocationContext::Unknown);
    }

    #[test]
    fn test_location_context_round_trip() {
        for ctx in [
            LocationContext::Equipped,
            LocationContext::Inventory,
            LocationContext::Stash,
            LocationContext::Mercenary,
            LocationContext::Corpse,
            LocationContext::Unknown,
        ] {
            assert_eq!(ctx.to_string().parse::<LocationContext>(), Ok(ctx));
        }
    }

    #[test]
    fn test_source_file_type_accepts_extensions() {
        assert_eq!("d2s".parse(), Ok(SourceFileType::CharacterSave));
        assert_eq!("sss".parse(), Ok(SourceFileType::PlugySharedStash));
        assert_eq!("d2x".parse(), Ok(SourceFileType::PlugyPersonalStash));
    }

    #[test]
    fn test_equipped_slot_code_round_trip() {
        for code in 1..=12 {
            let slot = EquippedSlot::from_code(code).unwrap();
            assert_eq!(slot.code(), code);
        }
        assert_eq!(EquippedSlot::from_code(0), None);
        assert_eq!(EquippedSlot::from_code(13), None);
    }

    #[test]
    fn test_invalid_tokens_are_rejected() {
        assert!("belt".parse::<LocationContext>().is_err());
        assert!("zip".parse::<SourceFileType>().is_err());
    }
}
