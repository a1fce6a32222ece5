//! Reliquary Storage - Storage Port and In-Memory Implementation
//!
//! Defines the single storage-port trait every caller depends on, plus the
//! in-memory reference implementation. The port is the only place
//! persistence is specified; swapping the engine (SQLite, whatever) means
//! implementing `VaultStore` once.
//!
//! Transactional contract: every multi-row mutation (`item_set_presence_bulk`,
//! `set_item_categories`, cascading deletes) is atomic - callers never
//! observe a partially-applied reconciliation or tag replacement.

use chrono::Utc;
use reliquary_core::{
    CanonicalLocation, CategoryId, CharacterId, EntityKind, GrailItemId, PresenceState,
    ReliquaryError, ReliquaryResult, ScanScope, SortOrder, SourceFileType, StorageError,
    Timestamp, VaultCategory, VaultConfig, VaultItem, VaultItemCategory, VaultItemFilter,
    VaultItemId, VaultItemPage, VaultSortKey,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Partial-update payload for vault items. Only `Some` fields are touched.
/// Positional columns move together through `location`; the nullable FK
/// columns are cleared through the detach hooks, not through updates.
#[derive(Debug, Clone, Default)]
pub struct VaultItemUpdate {
    pub item_name: Option<String>,
    pub item_code: Option<String>,
    pub quality: Option<String>,
    pub ethereal: Option<bool>,
    pub socket_count: Option<i32>,
    pub raw_item_json: Option<serde_json::Value>,
    pub source_character_id: Option<CharacterId>,
    pub source_character_name: Option<String>,
    pub source_file_type: Option<SourceFileType>,
    /// Overwrites all positional columns at once.
    pub location: Option<CanonicalLocation>,
    pub is_socketed_item: Option<bool>,
    pub icon_file_name: Option<String>,
    pub grail_item_id: Option<GrailItemId>,
    pub is_present_in_latest_scan: Option<bool>,
    pub last_seen_at: Option<Timestamp>,
    pub vaulted_at: Option<Timestamp>,
    pub unvaulted_at: Option<Timestamp>,
    /// Full-replacement membership set, not a merge.
    pub categories: Option<Vec<CategoryId>>,
}

/// Partial-update payload for categories.
#[derive(Debug, Clone, Default)]
pub struct VaultCategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// One presence transition applied by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub vault_item_id: VaultItemId,
    pub present: bool,
    /// New last-seen timestamp. `None` leaves `last_seen_at` untouched,
    /// which is how absent transitions preserve "last seen" semantics.
    pub seen_at: Option<Timestamp>,
}

// ============================================================================
// STORAGE PORT
// ============================================================================

/// Storage port for Reliquary entities.
/// Implementations provide persistence for vault items, categories, and the
/// membership join rows, and own the fingerprint uniqueness constraint.
pub trait VaultStore: Send + Sync {
    // === Item Operations ===

    /// Insert a new vault item. Fails on duplicate id or fingerprint.
    /// The hydrated `category_ids` field is persisted as membership rows.
    fn item_insert(&self, item: &VaultItem) -> ReliquaryResult<()>;

    /// Get a vault item by surrogate id, memberships hydrated.
    fn item_get(&self, id: &str) -> ReliquaryResult<Option<VaultItem>>;

    /// Get a vault item by fingerprint, memberships hydrated.
    fn item_get_by_fingerprint(&self, fingerprint: &str) -> ReliquaryResult<Option<VaultItem>>;

    /// Overwrite an existing row wholesale, keyed by its surrogate id.
    /// Membership rows are left untouched; the row's `category_ids` field is
    /// ignored on write and re-hydrated on read.
    fn item_replace(&self, item: &VaultItem) -> ReliquaryResult<()>;

    /// Partially update a vault item.
    fn item_update(&self, id: &str, update: VaultItemUpdate) -> ReliquaryResult<()>;

    /// Hard-delete a vault item, cascading its membership rows.
    fn item_delete(&self, id: &str) -> ReliquaryResult<()>;

    /// List all rows inside a scan scope, memberships hydrated.
    fn item_list_by_scope(&self, scope: &ScanScope) -> ReliquaryResult<Vec<VaultItem>>;

    /// Execute a filtered, sorted, paginated query.
    fn item_search(
        &self,
        filter: &VaultItemFilter,
        config: &VaultConfig,
    ) -> ReliquaryResult<VaultItemPage>;

    /// Apply a batch of presence transitions atomically: either every row is
    /// updated or none is.
    fn item_set_presence_bulk(&self, updates: &[PresenceUpdate]) -> ReliquaryResult<()>;

    // === Category Operations ===

    /// Insert a new category. Fails on duplicate id or duplicate name.
    fn category_insert(&self, category: &VaultCategory) -> ReliquaryResult<()>;

    /// Get a category by id.
    fn category_get(&self, id: CategoryId) -> ReliquaryResult<Option<VaultCategory>>;

    /// List all categories, sorted by name.
    fn category_list(&self) -> ReliquaryResult<Vec<VaultCategory>>;

    /// Partially update a category.
    fn category_update(&self, id: CategoryId, update: VaultCategoryUpdate) -> ReliquaryResult<()>;

    /// Delete a category, cascading its membership rows.
    fn category_delete(&self, id: CategoryId) -> ReliquaryResult<()>;

    /// Replace an item's full membership set atomically. The target set is
    /// deduplicated; re-adding an existing membership is a no-op.
    fn set_item_categories(&self, item_id: &str, categories: &[CategoryId])
        -> ReliquaryResult<()>;

    /// Resolved category ids for one item.
    fn categories_for_item(&self, item_id: &str) -> ReliquaryResult<Vec<CategoryId>>;

    // === External FK Hooks ===

    /// Null out `source_character_id` on every row referencing a deleted
    /// character. Returns the number of rows touched.
    fn detach_character(&self, character_id: CharacterId) -> ReliquaryResult<usize>;

    /// Null out `grail_item_id` on every row referencing a removed catalog
    /// entry. Returns the number of rows touched.
    fn detach_grail_item(&self, grail_item_id: &str) -> ReliquaryResult<usize>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
struct MemoryStoreInner {
    /// Rows keyed by surrogate id; `category_ids` is kept empty here and
    /// hydrated from `memberships` on read.
    items: HashMap<VaultItemId, VaultItem>,
    /// The fingerprint uniqueness constraint.
    fingerprint_index: HashMap<String, VaultItemId>,
    categories: HashMap<CategoryId, VaultCategory>,
    /// Join rows; the set makes duplicate membership structurally impossible.
    memberships: BTreeSet<VaultItemCategory>,
}

impl MemoryStoreInner {
    fn hydrated(&self, row: &VaultItem) -> VaultItem {
        let mut item = row.clone();
        item.category_ids = self
            .memberships
            .iter()
            .filter(|membership| membership.vault_item_id == item.vault_item_id)
            .map(|membership| membership.category_id)
            .collect();
        item
    }

    fn require_categories_exist(&self, categories: &[CategoryId]) -> ReliquaryResult<()> {
        for category_id in categories {
            if !self.categories.contains_key(category_id) {
                return Err(StorageError::NotFound {
                    entity: EntityKind::VaultCategory,
                    id: category_id.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn replace_memberships(&mut self, item_id: &str, categories: &[CategoryId]) {
        self.memberships
            .retain(|membership| membership.vault_item_id != item_id);
        for category_id in categories {
            self.memberships.insert(VaultItemCategory {
                vault_item_id: item_id.to_string(),
                category_id: *category_id,
            });
        }
    }
}

/// In-memory `VaultStore`. A single lock over the whole store makes every
/// multi-row mutation atomic and gives readers snapshot-consistent views,
/// matching the single-process, single-writer model of the desktop app.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.items.clear();
            inner.fingerprint_index.clear();
            inner.categories.clear();
            inner.memberships.clear();
        }
    }

    /// Get count of stored vault items.
    pub fn item_count(&self) -> usize {
        self.inner.read().map(|inner| inner.items.len()).unwrap_or(0)
    }

    /// Get count of stored categories.
    pub fn category_count(&self) -> usize {
        self.inner
            .read()
            .map(|inner| inner.categories.len())
            .unwrap_or(0)
    }

    /// Get count of membership join rows.
    pub fn membership_count(&self) -> usize {
        self.inner
            .read()
            .map(|inner| inner.memberships.len())
            .unwrap_or(0)
    }

    fn read(&self) -> ReliquaryResult<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|_| ReliquaryError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> ReliquaryResult<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|_| ReliquaryError::Storage(StorageError::LockPoisoned))
    }
}

impl VaultStore for MemoryStore {
    // === Item Operations ===

    fn item_insert(&self, item: &VaultItem) -> ReliquaryResult<()> {
        item.validate()?;
        let mut inner = self.write()?;
        if inner.items.contains_key(&item.vault_item_id) {
            return Err(StorageError::DuplicateId {
                id: item.vault_item_id.clone(),
            }
            .into());
        }
        if inner.fingerprint_index.contains_key(&item.fingerprint) {
            return Err(StorageError::DuplicateFingerprint {
                fingerprint: item.fingerprint.clone(),
            }
            .into());
        }
        inner.require_categories_exist(&item.category_ids)?;

        let mut row = item.clone();
        let categories = std::mem::take(&mut row.category_ids);
        inner
            .fingerprint_index
            .insert(row.fingerprint.clone(), row.vault_item_id.clone());
        for category_id in &categories {
            inner.memberships.insert(VaultItemCategory {
                vault_item_id: row.vault_item_id.clone(),
                category_id: *category_id,
            });
        }
        inner.items.insert(row.vault_item_id.clone(), row);
        Ok(())
    }

    fn item_get(&self, id: &str) -> ReliquaryResult<Option<VaultItem>> {
        let inner = self.read()?;
        Ok(inner.items.get(id).map(|row| inner.hydrated(row)))
    }

    fn item_get_by_fingerprint(&self, fingerprint: &str) -> ReliquaryResult<Option<VaultItem>> {
        let inner = self.read()?;
        Ok(inner
            .fingerprint_index
            .get(fingerprint)
            .and_then(|id| inner.items.get(id))
            .map(|row| inner.hydrated(row)))
    }

    fn item_replace(&self, item: &VaultItem) -> ReliquaryResult<()> {
        item.validate()?;
        let mut inner = self.write()?;
        let Some(existing) = inner.items.get(&item.vault_item_id) else {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultItem,
                id: item.vault_item_id.clone(),
            }
            .into());
        };
        let old_fingerprint = existing.fingerprint.clone();
        if old_fingerprint != item.fingerprint {
            if inner.fingerprint_index.contains_key(&item.fingerprint) {
                return Err(StorageError::DuplicateFingerprint {
                    fingerprint: item.fingerprint.clone(),
                }
                .into());
            }
            inner.fingerprint_index.remove(&old_fingerprint);
            inner
                .fingerprint_index
                .insert(item.fingerprint.clone(), item.vault_item_id.clone());
        }
        let mut row = item.clone();
        row.category_ids = Vec::new();
        inner.items.insert(row.vault_item_id.clone(), row);
        Ok(())
    }

    fn item_update(&self, id: &str, update: VaultItemUpdate) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        if !inner.items.contains_key(id) {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultItem,
                id: id.to_string(),
            }
            .into());
        }
        // All fallible checks run before any field is touched; a rejected
        // update leaves the row exactly as it was.
        if let Some(categories) = &update.categories {
            inner.require_categories_exist(categories)?;
        }
        if let Some(location) = &update.location {
            location.validate()?;
        }

        let item = inner
            .items
            .get_mut(id)
            .ok_or(StorageError::NotFound {
                entity: EntityKind::VaultItem,
                id: id.to_string(),
            })?;
        if let Some(item_name) = update.item_name {
            item.item_name = item_name;
        }
        if let Some(item_code) = update.item_code {
            item.item_code = Some(item_code);
        }
        if let Some(quality) = update.quality {
            item.quality = Some(quality);
        }
        if let Some(ethereal) = update.ethereal {
            item.ethereal = ethereal;
        }
        if let Some(socket_count) = update.socket_count {
            item.socket_count = Some(socket_count);
        }
        if let Some(raw_item_json) = update.raw_item_json {
            item.raw_item_json = Some(raw_item_json);
        }
        if let Some(source_character_id) = update.source_character_id {
            item.source_character_id = Some(source_character_id);
        }
        if let Some(source_character_name) = update.source_character_name {
            item.source_character_name = Some(source_character_name);
        }
        if let Some(source_file_type) = update.source_file_type {
            item.source_file_type = source_file_type;
        }
        if let Some(location) = &update.location {
            item.set_location(location);
        }
        if let Some(is_socketed_item) = update.is_socketed_item {
            item.is_socketed_item = is_socketed_item;
        }
        if let Some(icon_file_name) = update.icon_file_name {
            item.icon_file_name = Some(icon_file_name);
        }
        if let Some(grail_item_id) = update.grail_item_id {
            item.grail_item_id = Some(grail_item_id);
        }
        if let Some(is_present) = update.is_present_in_latest_scan {
            item.is_present_in_latest_scan = is_present;
        }
        if let Some(last_seen_at) = update.last_seen_at {
            item.last_seen_at = Some(last_seen_at);
        }
        if let Some(vaulted_at) = update.vaulted_at {
            item.vaulted_at = Some(vaulted_at);
        }
        if let Some(unvaulted_at) = update.unvaulted_at {
            item.unvaulted_at = Some(unvaulted_at);
        }
        item.last_updated = Utc::now();

        if let Some(categories) = update.categories {
            let deduplicated: Vec<CategoryId> = categories
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            inner.replace_memberships(id, &deduplicated);
        }

        Ok(())
    }

    fn item_delete(&self, id: &str) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        let Some(row) = inner.items.remove(id) else {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultItem,
                id: id.to_string(),
            }
            .into());
        };
        inner.fingerprint_index.remove(&row.fingerprint);
        inner
            .memberships
            .retain(|membership| membership.vault_item_id != id);
        Ok(())
    }

    fn item_list_by_scope(&self, scope: &ScanScope) -> ReliquaryResult<Vec<VaultItem>> {
        let inner = self.read()?;
        let mut items: Vec<VaultItem> = inner
            .items
            .values()
            .filter(|item| scope.matches(item))
            .map(|row| inner.hydrated(row))
            .collect();
        items.sort_by(|a, b| a.vault_item_id.cmp(&b.vault_item_id));
        Ok(items)
    }

    fn item_search(
        &self,
        filter: &VaultItemFilter,
        config: &VaultConfig,
    ) -> ReliquaryResult<VaultItemPage> {
        let filter = filter.normalized(config);
        let inner = self.read()?;

        let needle = filter.text.as_ref().map(|t| t.to_lowercase());
        let mut matched: Vec<VaultItem> = inner
            .items
            .values()
            .map(|row| inner.hydrated(row))
            .filter(|item| item_matches(item, &filter, needle.as_deref()))
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match filter.sort_key {
                VaultSortKey::ItemName => a
                    .item_name
                    .to_lowercase()
                    .cmp(&b.item_name.to_lowercase()),
                VaultSortKey::LastSeen => a.last_seen_at.cmp(&b.last_seen_at),
                VaultSortKey::Created => a.created.cmp(&b.created),
                VaultSortKey::Updated => a.last_updated.cmp(&b.last_updated),
            }
            .then_with(|| a.vault_item_id.cmp(&b.vault_item_id));
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as i32;
        let page = filter.page;
        let page_size = filter.page_size.unwrap_or(config.default_page_size);
        let start = (page as i64 - 1).saturating_mul(page_size as i64) as usize;
        let items = matched
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok(VaultItemPage {
            items,
            total,
            page,
            page_size,
        })
    }

    fn item_set_presence_bulk(&self, updates: &[PresenceUpdate]) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        // Validate the whole batch before touching anything: the batch is a
        // transaction, not a best-effort sweep.
        for update in updates {
            if !inner.items.contains_key(&update.vault_item_id) {
                return Err(StorageError::NotFound {
                    entity: EntityKind::VaultItem,
                    id: update.vault_item_id.clone(),
                }
                .into());
            }
        }
        let now = Utc::now();
        for update in updates {
            let item = inner
                .items
                .get_mut(&update.vault_item_id)
                .ok_or(StorageError::NotFound {
                    entity: EntityKind::VaultItem,
                    id: update.vault_item_id.clone(),
                })?;
            item.is_present_in_latest_scan = update.present;
            if let Some(seen_at) = update.seen_at {
                item.last_seen_at = Some(seen_at);
            }
            item.last_updated = now;
        }
        Ok(())
    }

    // === Category Operations ===

    fn category_insert(&self, category: &VaultCategory) -> ReliquaryResult<()> {
        category.validate()?;
        let mut inner = self.write()?;
        if inner.categories.contains_key(&category.category_id) {
            return Err(StorageError::DuplicateId {
                id: category.category_id.to_string(),
            }
            .into());
        }
        if inner
            .categories
            .values()
            .any(|existing| existing.name == category.name)
        {
            return Err(StorageError::DuplicateName {
                name: category.name.clone(),
            }
            .into());
        }
        inner
            .categories
            .insert(category.category_id, category.clone());
        Ok(())
    }

    fn category_get(&self, id: CategoryId) -> ReliquaryResult<Option<VaultCategory>> {
        let inner = self.read()?;
        Ok(inner.categories.get(&id).cloned())
    }

    fn category_list(&self) -> ReliquaryResult<Vec<VaultCategory>> {
        let inner = self.read()?;
        let mut categories: Vec<VaultCategory> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    fn category_update(&self, id: CategoryId, update: VaultCategoryUpdate) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        if !inner.categories.contains_key(&id) {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultCategory,
                id: id.to_string(),
            }
            .into());
        }
        if let Some(name) = &update.name {
            if inner
                .categories
                .values()
                .any(|existing| existing.category_id != id && &existing.name == name)
            {
                return Err(StorageError::DuplicateName { name: name.clone() }.into());
            }
        }

        let category = inner
            .categories
            .get_mut(&id)
            .ok_or(StorageError::NotFound {
                entity: EntityKind::VaultCategory,
                id: id.to_string(),
            })?;
        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(color) = update.color {
            category.color = Some(color);
        }
        if let Some(metadata) = update.metadata {
            category.metadata = Some(metadata);
        }
        category.last_updated = Utc::now();

        Ok(())
    }

    fn category_delete(&self, id: CategoryId) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        if inner.categories.remove(&id).is_none() {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultCategory,
                id: id.to_string(),
            }
            .into());
        }
        inner
            .memberships
            .retain(|membership| membership.category_id != id);
        Ok(())
    }

    fn set_item_categories(
        &self,
        item_id: &str,
        categories: &[CategoryId],
    ) -> ReliquaryResult<()> {
        let mut inner = self.write()?;
        if !inner.items.contains_key(item_id) {
            return Err(StorageError::NotFound {
                entity: EntityKind::VaultItem,
                id: item_id.to_string(),
            }
            .into());
        }
        inner.require_categories_exist(categories)?;
        let deduplicated: Vec<CategoryId> = categories
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        inner.replace_memberships(item_id, &deduplicated);
        Ok(())
    }

    fn categories_for_item(&self, item_id: &str) -> ReliquaryResult<Vec<CategoryId>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .iter()
            .filter(|membership| membership.vault_item_id == item_id)
            .map(|membership| membership.category_id)
            .collect())
    }

    // === External FK Hooks ===

    fn detach_character(&self, character_id: CharacterId) -> ReliquaryResult<usize> {
        let mut inner = self.write()?;
        let now = Utc::now();
        let mut touched = 0;
        for item in inner.items.values_mut() {
            if item.source_character_id == Some(character_id) {
                item.source_character_id = None;
                item.last_updated = now;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn detach_grail_item(&self, grail_item_id: &str) -> ReliquaryResult<usize> {
        let mut inner = self.write()?;
        let now = Utc::now();
        let mut touched = 0;
        for item in inner.items.values_mut() {
            if item.grail_item_id.as_deref() == Some(grail_item_id) {
                item.grail_item_id = None;
                item.last_updated = now;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

/// Whether one hydrated row matches a normalized filter.
fn item_matches(item: &VaultItem, filter: &VaultItemFilter, needle: Option<&str>) -> bool {
    if !filter.include_socketed && item.is_socketed_item {
        return false;
    }
    match filter.presence {
        PresenceState::All => {}
        PresenceState::Present => {
            if !item.is_present_in_latest_scan {
                return false;
            }
        }
        PresenceState::Missing => {
            if item.is_present_in_latest_scan {
                return false;
            }
        }
    }
    if let Some(character_id) = filter.source_character_id {
        if item.source_character_id != Some(character_id) {
            return false;
        }
    }
    if let Some(location_context) = filter.location_context {
        if item.location_context != location_context {
            return false;
        }
    }
    if let Some(source_file_type) = filter.source_file_type {
        if item.source_file_type != source_file_type {
            return false;
        }
    }
    if !filter.category_ids.is_empty()
        && !filter
            .category_ids
            .iter()
            .any(|category_id| item.category_ids.contains(category_id))
    {
        return false;
    }
    if let Some(needle) = needle {
        let name_hit = item.item_name.to_lowercase().contains(needle);
        let code_hit = item
            .item_code
            .as_ref()
            .is_some_and(|code| code.to_lowercase().contains(needle));
        let quality_hit = item
            .quality
            .as_ref()
            .is_some_and(|quality| quality.to_lowercase().contains(needle));
        if !name_hit && !code_hit && !quality_hit {
            return false;
        }
    }
    true
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
