//! Error types for the `duet-signer` crate.

use thiserror::Error;

/// An error raised while signing or recovering a transaction sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The signature is malformed or does not recover to a valid key.
    #[error("invalid transaction signature")]
    InvalidSignature,
    /// The signature's `v` value binds a different chain.
    #[error("invalid chain id for signer")]
    InvalidChainId,
    /// The transaction carries no signature.
    #[error("transaction not signed")]
    TransactionNotSigned,
    /// A private key could not be parsed.
    #[error("invalid private key")]
    InvalidPrivateKey,
}

/// A [Result] type for the [SignerError] enum.
pub type SignerResult<T> = Result<T, SignerError>;
