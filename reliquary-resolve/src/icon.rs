//! Icon filename resolver
//!
//! Resolves a canonical icon file name from every identity signal available
//! for an item, walking a fixed fallback chain from strongest signal
//! (catalog id) to weakest (caller-supplied fallback icon).

use crate::catalog::IconIndex;
use once_cell::sync::Lazy;
use regex::Regex;
use reliquary_core::GrailItemId;
use serde::{Deserialize, Serialize};

/// Item-type codes shared by multiple distinct catalog entries (the charm
/// codes: Annihilus vs small charm, Hellfire Torch vs large charm, Gheed's
/// Fortune vs grand charm). Code-tier lookups skip these so an exact name
/// match can disambiguate instead. A deliberate, enumerated special case -
/// do not infer it heuristically.
pub const AMBIGUOUS_ITEM_CODES: [&str; 3] = ["cm1", "cm2", "cm3"];

static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpg|jpeg|gif|webp|dds)$").unwrap());

/// Every identity signal available for one item, bundled for resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconResolveInput {
    /// Catalog id, when the item is already linked.
    pub grail_item_id: Option<GrailItemId>,
    pub item_code: Option<String>,
    /// Display name from the parser.
    pub item_name: Option<String>,
    pub unique_name: Option<String>,
    pub set_name: Option<String>,
    pub parsed_name: Option<String>,
    pub type_name: Option<String>,
    /// Raw icon hint from the save record (e.g. an `inv_file` graphic name).
    pub raw_icon_hint: Option<String>,
    /// Last-resort icon supplied by the caller.
    pub fallback_icon: Option<String>,
}

impl IconResolveInput {
    /// Extract resolution signals from a raw parsed item record.
    ///
    /// Never fails: missing keys, wrong types, or a non-object payload all
    /// degrade to `None` fields.
    pub fn from_raw_item(raw: &serde_json::Value) -> IconResolveInput {
        IconResolveInput {
            grail_item_id: None,
            item_code: str_field(raw, "code").or_else(|| str_field(raw, "type")),
            item_name: str_field(raw, "name"),
            unique_name: str_field(raw, "unique_name"),
            set_name: str_field(raw, "set_name"),
            parsed_name: str_field(raw, "parsed_name"),
            type_name: str_field(raw, "type_name"),
            raw_icon_hint: hint_field(raw, "inv_file"),
            fallback_icon: None,
        }
    }
}

fn str_field(raw: &serde_json::Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Icon hints sometimes arrive as bare numeric ids rather than strings.
fn hint_field(raw: &serde_json::Value, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve the canonical icon file name for an item.
///
/// Tiers, first match wins:
/// 1. catalog id
/// 2. item-type code, skipping the ambiguous charm codes
/// 3. name variants (display, unique, set, parsed), normalized
/// 4. slug guess from the first available of type/parsed/display/unique/set
/// 5. raw icon hint, normalized (numeric hints are literal icon ids)
/// 6. caller fallback icon, normalized
///
/// Returns `None` only when every tier comes up empty.
pub fn resolve_canonical_icon_filename(
    index: &IconIndex,
    input: &IconResolveInput,
) -> Option<String> {
    if let Some(id) = &input.grail_item_id {
        if let Some(icon) = index.icon_for_id(id) {
            return Some(icon.to_string());
        }
    }

    if let Some(code) = &input.item_code {
        let code_lower = code.to_ascii_lowercase();
        if !AMBIGUOUS_ITEM_CODES.contains(&code_lower.as_str()) {
            if let Some(icon) = index.icon_for_code(&code_lower) {
                return Some(icon.to_string());
            }
        }
    }

    for name in [
        &input.item_name,
        &input.unique_name,
        &input.set_name,
        &input.parsed_name,
    ]
    .into_iter()
    .flatten()
    {
        if let Some(icon) = index.icon_for_name(name) {
            return Some(icon.to_string());
        }
    }

    if let Some(name) = [
        &input.type_name,
        &input.parsed_name,
        &input.item_name,
        &input.unique_name,
        &input.set_name,
    ]
    .into_iter()
    .flatten()
    .next()
    {
        return Some(slugify_icon_name(name));
    }

    if let Some(hint) = &input.raw_icon_hint {
        return Some(normalize_icon_hint(hint));
    }

    input.fallback_icon.as_deref().map(normalize_icon_hint)
}

/// Normalize a name for index lookup: lowercase, non-alphanumerics stripped.
pub fn normalize_lookup_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Convert a display name into a snake_case `.png` filename guess.
pub fn slugify_icon_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug.push_str(".png");
    slug
}

/// Normalize a raw icon hint: strip a known image extension, lowercase,
/// append `.png`. Numeric hints are literal icon ids and normalize the same
/// way (`"4871"` becomes `"4871.png"`).
pub fn normalize_icon_hint(hint: &str) -> String {
    let stripped = IMAGE_EXTENSION.replace(hint.trim(), "");
    format!("{}.png", stripped.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn entry(id: &str, name: &str, code: Option<&str>, icon: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            item_code: code.map(str::to_string),
            item_type: None,
            icon: Some(icon.to_string()),
        }
    }

    /// Catalog slice around the charm ambiguity: the torch is indexed before
    /// the generic large charm, so a naive code lookup would resolve cm2 to
    /// the torch icon.
    fn charm_index() -> IconIndex {
        IconIndex::from_catalog(&[
            entry(
                "hellfire_torch",
                "Hellfire Torch",
                Some("cm2"),
                "hellfire_torch.png",
            ),
            entry("large_charm", "Large Charm", Some("cm2"), "large_charm.png"),
            entry("annihilus", "Annihilus", Some("cm1"), "annihilus.png"),
            entry(
                "harlequin_crest",
                "Harlequin Crest",
                Some("uap"),
                "harlequin_crest.png",
            ),
        ])
    }

    #[test]
    fn test_catalog_id_wins() {
        let input = IconResolveInput {
            grail_item_id: Some("harlequin_crest".to_string()),
            item_code: Some("cm2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("harlequin_crest.png".to_string())
        );
    }

    #[test]
    fn test_unambiguous_code_resolves() {
        let input = IconResolveInput {
            item_code: Some("uap".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("harlequin_crest.png".to_string())
        );
    }

    #[test]
    fn test_ambiguous_code_without_name_falls_through_to_name_tier() {
        // cm2 with no unique/set name: the code tier is skipped and the
        // display name resolves the generic large-charm icon, not the torch.
        let input = IconResolveInput {
            item_code: Some("cm2".to_string()),
            item_name: Some("Large Charm".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("large_charm.png".to_string())
        );
    }

    #[test]
    fn test_ambiguous_code_with_exact_name_disambiguates() {
        let input = IconResolveInput {
            item_code: Some("cm2".to_string()),
            item_name: Some("Hellfire Torch".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("hellfire_torch.png".to_string())
        );
    }

    #[test]
    fn test_slug_fallback_prefers_type_name() {
        let input = IconResolveInput {
            type_name: Some("Grand Charm".to_string()),
            item_name: Some("Mysterious Trinket".to_string()),
            ..Default::default()
        };
        // Neither name is in the catalog; the slug comes from the type name
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("grand_charm.png".to_string())
        );
    }

    #[test]
    fn test_raw_hint_normalization() {
        let input = IconResolveInput {
            raw_icon_hint: Some("invShako.DDS".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("invshako.png".to_string())
        );
    }

    #[test]
    fn test_numeric_hint_is_literal_icon_id() {
        let input = IconResolveInput {
            raw_icon_hint: Some("4871".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("4871.png".to_string())
        );
    }

    #[test]
    fn test_caller_fallback_is_last() {
        let input = IconResolveInput {
            fallback_icon: Some("default_item.jpg".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &input),
            Some("default_item.png".to_string())
        );
    }

    #[test]
    fn test_empty_input_resolves_to_none() {
        assert_eq!(
            resolve_canonical_icon_filename(&charm_index(), &IconResolveInput::default()),
            None
        );
    }

    #[test]
    fn test_from_raw_item_tolerates_garbage() {
        assert_eq!(
            IconResolveInput::from_raw_item(&serde_json::json!(42)),
            IconResolveInput::default()
        );
        let input = IconResolveInput::from_raw_item(&serde_json::json!({
            "name": "  ",
            "code": 17,
            "inv_file": 4871,
        }));
        assert_eq!(input.item_name, None);
        assert_eq!(input.item_code, None);
        assert_eq!(input.raw_icon_hint, Some("4871".to_string()));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify_icon_name("Gheed's Fortune"), "gheed_s_fortune.png");
        assert_eq!(slugify_icon_name("Large Charm"), "large_charm.png");
        assert_eq!(slugify_icon_name("  Torch  "), "torch.png");
    }

    #[test]
    fn test_normalize_lookup_key() {
        assert_eq!(normalize_lookup_key("Gheed's Fortune"), "gheedsfortune");
        assert_eq!(normalize_lookup_key("HELLFIRE torch"), "hellfiretorch");
    }
}
