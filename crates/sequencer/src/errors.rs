//! Error types for the `duet-sequencer` crate.

use duet_state::StateError;
use thiserror::Error;

/// An error raised while producing a block.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The mempool held no transactions this tick.
    #[error("no transactions in mempool")]
    NoPendingTxs,
    /// Every pending transaction failed execution; nothing to seal.
    #[error("all pending transactions failed execution")]
    AllFailed,
    /// The state store failed.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// A [Result] type for the [SequencerError] enum.
pub type SequencerResult<T> = Result<T, SequencerError>;
