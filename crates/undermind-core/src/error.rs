//! Error types
//!
//! Crate-wide error taxonomy:
//! - [`StorageError`]: persistence read/write failures. Reads degrade to
//!   empty subsystems; writes surface when fatal to the operation.
//! - [`ProviderError`]: LLM call failures (defined in [`crate::provider`]).
//!   Callers degrade to non-LLM code paths.
//! - [`MindError::Validation`]: an API precondition was violated; surfaced
//!   to the caller with no state mutated.

use crate::provider::ProviderError;

// ============================================================================
// STORAGE ERRORS
// ============================================================================

/// Storage error type shared by all persistent stores
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A persisted document is malformed
    #[error("Parse error: {0}")]
    Parse(String),
    /// A lock guarding a store was poisoned
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

/// Storage result type
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ============================================================================
// CRATE-LEVEL ERRORS
// ============================================================================

/// Top-level error type for orchestrator-facing operations
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MindError {
    /// LLM provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Persistence read/write failed
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An API precondition was violated; no state was mutated
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Crate-level result type
pub type Result<T> = std::result::Result<T, MindError>;

/// Check that a scalar parameter lies in `[0, 1]`
pub(crate) fn validate_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MindError::Validation(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_unit_bounds() {
        assert!(validate_unit("weight", 0.0).is_ok());
        assert!(validate_unit("weight", 1.0).is_ok());
        assert!(validate_unit("weight", 0.5).is_ok());
        assert!(validate_unit("weight", -0.01).is_err());
        assert!(validate_unit("weight", 1.01).is_err());
        assert!(validate_unit("weight", f64::NAN).is_err());
    }

    #[test]
    fn test_validation_message_names_parameter() {
        let err = validate_unit("confidence", 2.0).unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }
}
