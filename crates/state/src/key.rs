//! Keyspace layout of the persisted state.
//!
//! Four namespaces share one flat key-value store, distinguished by ASCII
//! prefixes. Keys within a namespace sort bytewise, which the state root
//! computation relies on.

use alloy_primitives::{Address, B256, U256};

/// Prefix of account entries.
pub(crate) const ACCOUNT_PREFIX: &[u8] = b"acc-";

/// Prefix of contract-storage entries (reserved surface).
pub(crate) const STORAGE_PREFIX: &[u8] = b"st-";

/// Prefix of pool entries.
pub(crate) const POOL_PREFIX: &[u8] = b"pool-";

/// Prefix of block entries.
pub(crate) const BLOCK_PREFIX: &[u8] = b"block-";

/// Key of the chain tip height; the value is a 32-byte big-endian integer.
pub const BLOCK_HEIGHT_KEY: &[u8] = b"meta-blockheight";

/// Key of an account entry: `acc-` followed by the 20-byte address.
pub fn account_key(addr: Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_PREFIX.len() + Address::len_bytes());
    key.extend_from_slice(ACCOUNT_PREFIX);
    key.extend_from_slice(addr.as_slice());
    key
}

/// Key of a storage slot: `st-` followed by the address and the 32-byte slot.
pub fn storage_key(addr: Address, slot: B256) -> Vec<u8> {
    let mut key = Vec::with_capacity(STORAGE_PREFIX.len() + Address::len_bytes() + 32);
    key.extend_from_slice(STORAGE_PREFIX);
    key.extend_from_slice(addr.as_slice());
    key.extend_from_slice(slot.as_slice());
    key
}

/// Key of a pool entry: `pool-` followed by the pair name bytes.
pub fn pool_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(POOL_PREFIX.len() + name.len());
    key.extend_from_slice(POOL_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Key of a block entry: `block-` followed by the 32-byte big-endian number.
pub fn block_key(number: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(BLOCK_PREFIX.len() + 32);
    key.extend_from_slice(BLOCK_PREFIX);
    key.extend_from_slice(&U256::from(number).to_be_bytes::<32>());
    key
}
