//! Chain-wide constants.

use alloy_primitives::U256;

/// Symbol of the primary native token. Gas is always paid in it.
pub const PRIMARY_TOKEN: &str = "P";

/// Symbol of the secondary native token.
pub const SECONDARY_TOKEN: &str = "S";

/// Canonical pair name of the built-in constant-product pool.
pub const POOL_PAIR: &str = "P-S";

/// Gas price applied when a transaction does not carry one (1 gwei).
pub const DEFAULT_GAS_PRICE: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Flat gas accounted per included transaction in a block header.
pub const TX_GAS_USED: u64 = 21_000;
