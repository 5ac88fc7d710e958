//! Transaction type and its canonical hashing.

use crate::params::DEFAULT_GAS_PRICE;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// The discriminant of a [Transaction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TxType {
    /// Moves value of a single token between accounts.
    Transfer = 0,
    /// Trades primary for secondary through the built-in pool.
    Swap = 1,
    /// Deposits both native tokens into the built-in pool.
    AddLiquidity = 2,
    /// Reserved for a later phase; rejected by the executor.
    RemoveLiquidity = 3,
}

impl From<TxType> for u8 {
    fn from(ty: TxType) -> Self {
        ty as Self
    }
}

impl TryFrom<u8> for TxType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Transfer),
            1 => Ok(Self::Swap),
            2 => Ok(Self::AddLiquidity),
            3 => Ok(Self::RemoveLiquidity),
            ty => Err(format!("invalid transaction type: {ty}")),
        }
    }
}

/// A duet transaction.
///
/// `from` is populated either by sender recovery at the admission boundary or
/// directly in dev paths; a transaction carrying `from` but no signature is a
/// dev-mode transaction and is never accepted by signature-verified admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The transaction type.
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// Sender account nonce.
    pub nonce: u64,
    /// Sender address, known after recovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient address. Only meaningful for transfers; `None` burns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Value moved by the type-specific step.
    pub value: U256,
    /// Gas limit.
    pub gas: u64,
    /// Gas price; `None` falls back to [DEFAULT_GAS_PRICE].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// Opaque payload, interpreted per transaction type.
    pub data: Bytes,
    /// Signature `v`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    /// Signature `r`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<U256>,
    /// Signature `s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<U256>,
}

/// The canonical RLP shape of a [Transaction], with absent fields normalized
/// to empty strings / zero.
#[derive(RlpEncodable)]
struct TxEncoding {
    tx_type: u8,
    nonce: u64,
    from: Bytes,
    to: Bytes,
    value: U256,
    gas: u64,
    gas_price: U256,
    data: Bytes,
    v: U256,
    r: U256,
    s: U256,
}

impl Transaction {
    /// Computes the Keccak-256 hash of the transaction over its canonical RLP
    /// encoding. Every consumer of a transaction identity (mempool dedup,
    /// block index, tests) uses this hash.
    pub fn hash(&self) -> B256 {
        let encoding = TxEncoding {
            tx_type: self.tx_type.into(),
            nonce: self.nonce,
            from: self.from.map(|a| Bytes::copy_from_slice(a.as_slice())).unwrap_or_default(),
            to: self.to.map(|a| Bytes::copy_from_slice(a.as_slice())).unwrap_or_default(),
            value: self.value,
            gas: self.gas,
            gas_price: self.gas_price.unwrap_or_default(),
            data: self.data.clone(),
            v: self.v.unwrap_or_default(),
            r: self.r.unwrap_or_default(),
            s: self.s.unwrap_or_default(),
        };
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&encoding, &mut buf);
        keccak256(&buf)
    }

    /// Returns the gas price, falling back to [DEFAULT_GAS_PRICE].
    pub fn effective_gas_price(&self) -> U256 {
        self.gas_price.unwrap_or(DEFAULT_GAS_PRICE)
    }

    /// Whether the transaction carries a full `(v, r, s)` signature.
    pub const fn is_signed(&self) -> bool {
        self.v.is_some() && self.r.is_some() && self.s.is_some()
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            tx_type: TxType::Transfer,
            nonce: 0,
            from: None,
            to: None,
            value: U256::ZERO,
            gas: 0,
            gas_price: None,
            data: Bytes::new(),
            v: None,
            r: None,
            s: None,
        }
    }
}
