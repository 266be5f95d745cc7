use thiserror::Error;

use crate::econ::types::ItemKind;

/// Errors that can arise while executing economy operations.
///
/// Cooldowns are deliberately not represented here: a still-cooling action
/// is a guarded no-op reported on the success path, not a failure.
#[derive(Debug, Error)]
pub enum EconError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Sender balance is below the requested amount.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Nothing (or not enough) of the item is held.
    #[error("insufficient inventory: {held} {item:?} held")]
    InsufficientInventory { item: ItemKind, held: u64 },

    /// Malformed amount, unknown item, missing target. The message carries
    /// usage guidance and is shown to the user verbatim.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A persistence call exceeded the operation deadline. Nothing was
    /// committed, so the triggering operation is safe to retry.
    #[error("operation timed out")]
    Timeout,
}

impl EconError {
    /// True for failures the caller may simply retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EconError::Sled(_) | EconError::Bincode(_) | EconError::Io(_) | EconError::Timeout
        )
    }
}
