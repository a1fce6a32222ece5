//! Reliquary Vault - Reconciliation Engine
//!
//! The stateful heart of the tracker: upsert-by-fingerprint ingestion,
//! scan-based presence reconciliation, category tagging, and the read-only
//! search facade. The only crate that touches persistent storage, always
//! through the `VaultStore` port.

pub mod engine;
pub mod ingest;
pub mod search;

pub use engine::{NewVaultCategory, NewVaultItem, ReconcileSummary, VaultEngine};
pub use ingest::{IngestSummary, RawScanRecord, ScanBatch};
