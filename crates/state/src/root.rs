//! State root computation shared by the store implementations.

use alloy_primitives::{keccak256, B256};

/// Accumulates state entries into a deterministic commitment.
///
/// Entries must be fed in bytewise key order; both store implementations
/// iterate their account and pool namespaces sorted, so an identical write
/// history produces an identical root regardless of the backing store.
#[derive(Debug, Default)]
pub(crate) struct StateRootBuilder {
    buf: Vec<u8>,
}

impl StateRootBuilder {
    /// Creates an empty builder.
    pub(crate) const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends one length-framed `key || value` entry.
    pub(crate) fn add(&mut self, key: &[u8], value: &[u8]) {
        self.buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(value);
    }

    /// Hashes the accumulated entries.
    pub(crate) fn finish(self) -> B256 {
        keccak256(&self.buf)
    }
}
