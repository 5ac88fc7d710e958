//! Block and header types.

use crate::transaction::Transaction;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// Metadata of a produced block.
///
/// `tx_root`, `receipt_root` and `gas_limit` are reserved for later phases:
/// they are never computed, serialize as zero, and must keep doing so.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Hash of the parent block's header; zero for the first block.
    pub parent_hash: B256,
    /// State root returned by the state commit that sealed this block.
    pub state_root: B256,
    /// Reserved.
    pub tx_root: B256,
    /// Reserved.
    pub receipt_root: B256,
    /// Block number.
    pub number: u64,
    /// Wall-clock seconds at production time.
    pub timestamp: u64,
    /// Address of the sequencer that produced the block.
    pub coinbase: Address,
    /// Opaque extra data.
    #[serde(rename = "extraData")]
    pub extra: Bytes,
    /// Flat gas accounted for the block's transactions.
    pub gas_used: u64,
    /// Reserved; always zero.
    pub gas_limit: u64,
}

/// The subset of header fields covered by the header hash.
#[derive(RlpEncodable)]
struct HeaderEncoding {
    parent_hash: B256,
    state_root: B256,
    number: u64,
    timestamp: u64,
}

impl Header {
    /// Computes the Keccak-256 hash of the header over the canonical RLP
    /// encoding of `(parent_hash, state_root, number, timestamp)`.
    pub fn hash(&self) -> B256 {
        let encoding = HeaderEncoding {
            parent_hash: self.parent_hash,
            state_root: self.state_root,
            number: self.number,
            timestamp: self.timestamp,
        };
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&encoding, &mut buf);
        keccak256(&buf)
    }
}

/// A complete block: header plus the ordered transactions it includes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Transactions in execution order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new [Block] from a header and transactions.
    pub const fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    /// The block number, taken from the header.
    pub const fn number(&self) -> u64 {
        self.header.number
    }
}
