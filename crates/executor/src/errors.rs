//! Error types for the `duet-executor` crate.

use alloy_primitives::U256;
use duet_state::StateError;
use thiserror::Error;

/// An error raised while executing a transaction.
///
/// Every variant except [ExecutorError::State] means the transaction itself
/// is invalid against the current state and is dropped from the block being
/// built.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The transaction nonce does not match the sender's account nonce.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce {
        /// The sender's current account nonce.
        expected: u64,
        /// The nonce the transaction carried.
        got: u64,
    },
    /// The sender cannot cover the value being moved.
    #[error("insufficient {token} balance")]
    InsufficientBalance {
        /// The token whose balance fell short.
        token: String,
    },
    /// The sender cannot fund the gas cost in the primary token.
    #[error("insufficient primary balance for gas: need {required}, have {available}")]
    InsufficientGas {
        /// The full gas cost.
        required: U256,
        /// The sender's primary balance.
        available: U256,
    },
    /// The pool has no liquidity to swap against.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    /// The swap output truncated to zero.
    #[error("insufficient output amount")]
    Slippage,
    /// The transaction type is not executable.
    #[error("unknown transaction type: {0}")]
    UnknownTxType(u8),
    /// The state store failed.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// A [Result] type for the [ExecutorError] enum.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
