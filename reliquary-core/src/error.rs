//! Error types for Reliquary operations

use crate::EntityKind;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Fingerprint already vaulted: {fingerprint}")]
    DuplicateFingerprint { fingerprint: String },

    #[error("Duplicate id: {id}")]
    DuplicateId { id: String },

    #[error("Duplicate category name: {name}")]
    DuplicateName { name: String },

    /// A row written in this operation could not be re-read. This is a
    /// storage-contract violation, not a normal not-found.
    #[error("Readback failed for {entity} with id {id} after write")]
    ReadbackFailed { entity: EntityKind, id: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level error type wrapping all layers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReliquaryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Reliquary operations.
pub type ReliquaryResult<T> = Result<T, ReliquaryError>;
