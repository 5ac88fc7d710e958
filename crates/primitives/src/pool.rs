//! Constant-product pool state.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A constant-product liquidity pool, keyed in state by its canonical pair
/// name (e.g. [POOL_PAIR]).
///
/// [POOL_PAIR]: crate::params::POOL_PAIR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Reserve of the primary token.
    pub reserve0: U256,
    /// Reserve of the secondary token.
    pub reserve1: U256,
    /// Outstanding LP shares.
    pub total_supply: U256,
}

impl Pool {
    /// The invariant product `reserve0 * reserve1`.
    pub fn constant_product(&self) -> U256 {
        self.reserve0.saturating_mul(self.reserve1)
    }
}
