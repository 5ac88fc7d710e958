//! Error types for the `duet-settlement` crate.

use duet_sequencer::SequencerError;
use thiserror::Error;

/// An error raised while forming or submitting a settlement batch.
///
/// Any submission failure leaves `last_settled` untouched, so the next tick
/// retries the same block range.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Real-mode settlement was requested without a connected L1 client.
    #[error("no L1 client connected")]
    L1NotConnected,
    /// The L1 client rejected or failed the submission.
    #[error("L1 submission failed: {0}")]
    L1SubmitFailed(String),
    /// There are no unsettled blocks.
    #[error("no new blocks to settle")]
    NoNewBlocks,
    /// Reading blocks from the sequencer failed.
    #[error("sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
}

/// A [Result] type for the [SettlementError] enum.
pub type SettlementResult<T> = Result<T, SettlementError>;
