//! Scan ingestion pipeline
//!
//! Wires the pure resolvers to the engine: each raw parser record is
//! fingerprinted, spatially normalized, and icon-resolved, then upserted;
//! the batch closes with a presence reconciliation over its scope. Malformed
//! records degrade through resolver fallbacks, they never abort the batch.

use crate::engine::{NewVaultItem, ReconcileSummary, VaultEngine};
use reliquary_core::location::{RawLocationRecord, RAW_LOCATION_SOCKETED};
use reliquary_core::{
    fingerprint_for_raw_item, CharacterId, Fingerprint, GrailItemId, LocationContext,
    ReliquaryResult, ScanReport, ScanScope, Timestamp,
};
use reliquary_resolve::{
    resolve_canonical_icon_filename, resolve_spatial_location, IconIndex, IconResolveInput,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One raw item record from the save-file parser, with the per-record
/// context the parser knows (which tab page it was reading, which character
/// owns the file) that the item JSON itself does not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScanRecord {
    /// The full parser output for this item, kept opaque.
    pub raw: serde_json::Value,
    /// Precomputed fingerprint; derived from `raw` when absent.
    pub fingerprint: Option<Fingerprint>,
    /// Catalog linkage, when the caller already matched the item.
    pub grail_item_id: Option<GrailItemId>,
    pub source_character_id: Option<CharacterId>,
    pub source_character_name: Option<String>,
    /// Location to assume when the record yields no actionable signal.
    pub fallback_location: LocationContext,
    /// Tab page the parser was reading; honored when the resolved or
    /// fallback context is stash.
    pub fallback_stash_tab: Option<i32>,
    /// Last-resort icon for the icon resolver.
    pub fallback_icon: Option<String>,
}

impl RawScanRecord {
    pub fn new(raw: serde_json::Value) -> Self {
        Self {
            raw,
            fingerprint: None,
            grail_item_id: None,
            source_character_id: None,
            source_character_name: None,
            fallback_location: LocationContext::Unknown,
            fallback_stash_tab: None,
            fallback_icon: None,
        }
    }
}

/// One scan's worth of raw records plus its reconciliation scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanBatch {
    pub scope: ScanScope,
    pub scanned_at: Timestamp,
    pub records: Vec<RawScanRecord>,
}

/// Outcome of one ingested batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub upserted: usize,
    pub reconcile: ReconcileSummary,
}

impl VaultEngine {
    /// Ingest a full scan: annotate every record through the resolvers,
    /// upsert by fingerprint, then reconcile presence for the scan's scope.
    pub fn ingest_scan(
        &self,
        icon_index: &IconIndex,
        batch: &ScanBatch,
    ) -> ReliquaryResult<IngestSummary> {
        let mut present_fingerprints: HashSet<Fingerprint> =
            HashSet::with_capacity(batch.records.len());
        let mut upserted = 0;

        for record in &batch.records {
            let fingerprint = record
                .fingerprint
                .clone()
                .unwrap_or_else(|| fingerprint_for_raw_item(&record.raw));

            let raw_location = RawLocationRecord::from_raw_json(&record.raw);
            let is_socketed_item = raw_location.location_code == Some(RAW_LOCATION_SOCKETED);
            let location = resolve_spatial_location(
                &raw_location,
                batch.scope.source_file_type,
                record.fallback_location,
                record.fallback_stash_tab,
            );

            let mut icon_input = IconResolveInput::from_raw_item(&record.raw);
            icon_input.grail_item_id = record.grail_item_id.clone();
            icon_input.fallback_icon = record.fallback_icon.clone();
            let icon_file_name = resolve_canonical_icon_filename(icon_index, &icon_input);

            let input = NewVaultItem {
                fingerprint: fingerprint.clone(),
                item_name: display_name(&icon_input),
                item_code: icon_input.item_code.clone(),
                quality: str_field(&record.raw, "quality"),
                ethereal: bool_field(&record.raw, "ethereal"),
                socket_count: int_field(&record.raw, "socket_count")
                    .or_else(|| int_field(&record.raw, "total_nr_of_sockets")),
                raw_item_json: Some(record.raw.clone()),
                source_character_id: record.source_character_id,
                source_character_name: record.source_character_name.clone(),
                source_file_type: batch.scope.source_file_type,
                location,
                is_socketed_item,
                icon_file_name,
                grail_item_id: record.grail_item_id.clone(),
                category_ids: Vec::new(),
                seen_at: Some(batch.scanned_at),
            };
            self.upsert_vault_item_by_fingerprint(input)?;
            present_fingerprints.insert(fingerprint);
            upserted += 1;
        }

        let reconcile = self.reconcile_vault_items_for_scan(&ScanReport {
            scope: batch.scope,
            present_fingerprints,
            scanned_at: batch.scanned_at,
        })?;
        tracing::info!(upserted, "ingested scan batch");

        Ok(IngestSummary { upserted, reconcile })
    }
}

/// Best display name available for a record: display, unique, set, parsed,
/// type name, then a placeholder for fully anonymous records.
fn display_name(input: &IconResolveInput) -> String {
    [
        &input.item_name,
        &input.unique_name,
        &input.set_name,
        &input.parsed_name,
        &input.type_name,
    ]
    .into_iter()
    .flatten()
    .next()
    .cloned()
    .unwrap_or_else(|| "Unknown Item".to_string())
}

fn str_field(raw: &serde_json::Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(raw: &serde_json::Value, key: &str) -> bool {
    match raw.get(key) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

fn int_field(raw: &serde_json::Value, key: &str) -> Option<i32> {
    raw.get(key)
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
}
