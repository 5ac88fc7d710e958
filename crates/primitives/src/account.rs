//! Account state.

use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user or contract account.
///
/// `code`, `code_hash` and `storage_root` are reserved for contract support;
/// the core never interprets them but they round-trip through persistence.
/// A missing account reads as [Account::default].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Monotonically increasing transaction counter.
    pub nonce: u64,
    /// Balance of the primary native token. Pays gas.
    pub balance_primary: U256,
    /// Balance of the secondary native token.
    pub balance_secondary: U256,
    /// Balances of general tokens, keyed by symbol. Absent keys read as zero.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub token_balances: BTreeMap<String, U256>,
    /// Reserved contract bytecode.
    #[serde(default)]
    pub code: Bytes,
    /// Reserved hash of `code`.
    pub code_hash: B256,
    /// Reserved storage root.
    pub storage_root: B256,
}

impl Account {
    /// Returns the balance of a general token; absent keys read as zero.
    pub fn token_balance(&self, token: &str) -> U256 {
        self.token_balances.get(token).copied().unwrap_or_default()
    }
}
