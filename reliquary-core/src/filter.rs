//! Search filter and page types for vault queries

use crate::config::VaultConfig;
use crate::entities::VaultItem;
use crate::enums::{LocationContext, PresenceState, SortOrder, SourceFileType, VaultSortKey};
use crate::{CategoryId, CharacterId};
use serde::{Deserialize, Serialize};

/// Filter for `search_vault_items`. Every field is optional; the default
/// filter matches all non-socketed items, newest-seen first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItemFilter {
    /// Free text, matched case-insensitively against item name, item code,
    /// and quality label.
    pub text: Option<String>,
    pub source_character_id: Option<CharacterId>,
    pub location_context: Option<LocationContext>,
    pub source_file_type: Option<SourceFileType>,
    pub presence: PresenceState,
    /// Socketed items (gems/runes inside a host item) are hidden unless asked
    /// for explicitly.
    pub include_socketed: bool,
    /// Non-empty means: item must belong to at least one of these categories.
    pub category_ids: Vec<CategoryId>,
    pub sort_key: VaultSortKey,
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: i32,
    /// Rows per page; `None` takes the configured default.
    pub page_size: Option<i32>,
}

impl Default for VaultItemFilter {
    fn default() -> Self {
        Self {
            text: None,
            source_character_id: None,
            location_context: None,
            source_file_type: None,
            presence: PresenceState::default(),
            include_socketed: false,
            category_ids: Vec::new(),
            sort_key: VaultSortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: None,
        }
    }
}

impl VaultItemFilter {
    /// Clamp paging to sane bounds and trim the free-text needle.
    /// Empty text collapses to no text filter.
    pub fn normalized(&self, config: &VaultConfig) -> VaultItemFilter {
        let mut normalized = self.clone();
        normalized.text = self
            .text
            .as_ref()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        normalized.page = self.page.max(1);
        let page_size = self.page_size.unwrap_or(config.default_page_size);
        normalized.page_size = Some(page_size.clamp(1, config.max_page_size));
        normalized
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItemPage {
    pub items: Vec<VaultItem>,
    /// Total matches before pagination.
    pub total: i32,
    pub page: i32,
    pub page_size: i32,
}
