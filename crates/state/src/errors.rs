//! Error types for the `duet-state` crate.

use thiserror::Error;

/// An error raised by a [StateStore] implementation.
///
/// Absent keys are never errors; they read as the type's zero value.
///
/// [StateStore]: crate::StateStore
#[derive(Debug, Error)]
pub enum StateError {
    /// The underlying key-value database failed.
    #[error("database error: {0}")]
    Database(String),
    /// A stored value failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<rocksdb::Error> for StateError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A [Result] type for the [StateError] enum.
pub type StateResult<T> = Result<T, StateError>;
