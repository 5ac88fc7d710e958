//! Raw secp256k1 helpers shared by transaction signing and L1 settlement.

use crate::{SignerError, SignerResult};
use alloy_primitives::{hex, keccak256, Address, B256, U256};
use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};

/// Parses a hex-encoded secp256k1 private key, with or without a `0x` prefix.
pub fn parse_signing_key(hex_key: &str) -> SignerResult<SigningKey> {
    let bytes = hex::decode(hex_key.trim_start_matches("0x"))
        .map_err(|_| SignerError::InvalidPrivateKey)?;
    SigningKey::from_slice(&bytes).map_err(|_| SignerError::InvalidPrivateKey)
}

/// The address of a key: the last 20 bytes of the Keccak-256 hash of the
/// uncompressed public key, tag byte stripped.
pub fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..])
}

/// Signs a 32-byte digest and encodes the recovery id per EIP-155:
/// `v = recovery_id + 35 + 2 * chain_id`. Returns `(v, r, s)`.
pub fn sign_prehash_eip155(
    key: &SigningKey,
    digest: B256,
    chain_id: u64,
) -> SignerResult<(U256, U256, U256)> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|_| SignerError::InvalidSignature)?;
    let bytes = signature.to_bytes();
    let v = U256::from(u64::from(recovery_id.to_byte()) + 35 + 2 * chain_id);
    Ok((v, U256::from_be_slice(&bytes[..32]), U256::from_be_slice(&bytes[32..])))
}

/// Recovers the signing address from a digest, an `(r, s)` pair and a raw
/// recovery id.
pub fn recover_prehash(
    digest: B256,
    r: U256,
    s: U256,
    recovery_id: u8,
) -> SignerResult<Address> {
    let signature =
        Signature::from_scalars(r.to_be_bytes::<32>(), s.to_be_bytes::<32>())
            .map_err(|_| SignerError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(recovery_id).ok_or(SignerError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        .map_err(|_| SignerError::InvalidSignature)?;
    let point = key.to_encoded_point(false);
    Ok(Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..]))
}
