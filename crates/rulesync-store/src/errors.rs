//! Error helpers for rulesync-store
//!
//! The store speaks `ExError` from rulesync-core; these helpers build the
//! store's recurring error shapes.

use rulesync_core::errors::{ExError, ExErrorKind, RuleSyncError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::MigrationFailed)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::MigrationFailed)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

pub fn fixture_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidFixture)
        .with_op("fixture_parse")
        .with_message(reason.to_string())
}

pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

pub fn from_serde_json(err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
}

pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

pub fn lock_poisoned(operation: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(operation.to_string())
        .with_message("connection lock poisoned")
}

/// Stored data that no longer passes domain validation
pub fn corrupt_row(operation: &str, err: RuleSyncError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(operation.to_string())
        .with_message(format!("stored row is invalid: {}", err))
}
