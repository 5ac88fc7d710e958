//! The transaction [Executor].

use crate::{ExecutorError, ExecutorResult};
use alloy_primitives::{Address, U256, U512};
use duet_primitives::{TxType, Transaction, POOL_PAIR, PRIMARY_TOKEN, SECONDARY_TOKEN};
use duet_state::{SharedStateStore, StateStore};

/// Applies transactions to state.
///
/// Checks and mutations run in a fixed order for every transaction type:
/// nonce equality, gas funding and debit, the type-specific step, then the
/// nonce increment. The type-specific step completes every read and check
/// before its first write, so a failed transaction leaves exactly one
/// effect behind: the gas debit.
#[derive(Debug, Clone)]
pub struct Executor {
    state: SharedStateStore,
}

impl Executor {
    /// Creates a new [Executor] over the given state.
    pub fn new(state: SharedStateStore) -> Self {
        Self { state }
    }

    /// Executes a transaction from the given (already recovered) sender.
    ///
    /// The state write lock is held for the whole transition; concurrent
    /// readers observe either none or all of a transaction's effects.
    pub async fn execute(&self, tx: &Transaction, from: Address) -> ExecutorResult<()> {
        let mut state = self.state.write().await;
        Self::apply(&mut *state, tx, from)
    }

    /// Unconditionally credits native balances. Genesis bootstrap only.
    pub async fn mint(
        &self,
        addr: Address,
        primary: Option<U256>,
        secondary: Option<U256>,
    ) -> ExecutorResult<()> {
        let mut state = self.state.write().await;
        if let Some(amount) = primary {
            let balance = state.get_balance_primary(addr)?;
            state.set_balance_primary(addr, balance.saturating_add(amount))?;
        }
        if let Some(amount) = secondary {
            let balance = state.get_balance_secondary(addr)?;
            state.set_balance_secondary(addr, balance.saturating_add(amount))?;
        }
        Ok(())
    }

    /// Unconditionally credits a general token balance. Genesis bootstrap
    /// only.
    pub async fn mint_token(
        &self,
        addr: Address,
        token: &str,
        amount: U256,
    ) -> ExecutorResult<()> {
        let mut state = self.state.write().await;
        let balance = state.get_balance_token(addr, token)?;
        state.set_balance_token(addr, token, balance.saturating_add(amount))?;
        Ok(())
    }

    fn apply(state: &mut dyn StateStore, tx: &Transaction, from: Address) -> ExecutorResult<()> {
        // 1. Nonce discipline.
        let expected = state.get_nonce(from)?;
        if tx.nonce != expected {
            return Err(ExecutorError::InvalidNonce { expected, got: tx.nonce });
        }

        // 2. Gas is funded and paid in the primary token, before the
        //    type-specific step. The debit is retained if that step fails.
        let gas_cost = U256::from(tx.gas).saturating_mul(tx.effective_gas_price());
        let primary = state.get_balance_primary(from)?;
        if primary < gas_cost {
            return Err(ExecutorError::InsufficientGas { required: gas_cost, available: primary });
        }
        state.set_balance_primary(from, primary - gas_cost)?;

        // 3. Type-specific step.
        match tx.tx_type {
            TxType::Transfer => Self::transfer(state, tx, from)?,
            TxType::Swap => Self::swap(state, tx, from)?,
            TxType::AddLiquidity => Self::add_liquidity(state, tx, from)?,
            TxType::RemoveLiquidity => {
                return Err(ExecutorError::UnknownTxType(tx.tx_type.into()))
            }
        }

        // 4. Nonce increment, only on success.
        state.set_nonce(from, expected + 1)?;
        Ok(())
    }

    /// Moves `value` of a single token. The token is named by `data`: empty
    /// selects the primary token, `"S"` the secondary, anything else a
    /// general token. A missing recipient burns the value.
    fn transfer(state: &mut dyn StateStore, tx: &Transaction, from: Address) -> ExecutorResult<()> {
        let token = if tx.data.is_empty() {
            PRIMARY_TOKEN.to_string()
        } else {
            String::from_utf8_lossy(&tx.data).into_owned()
        };

        // Read after the gas debit, so a primary self-transfer cannot spend
        // the gas it just paid.
        let balance = balance_of(state, from, &token)?;
        if balance < tx.value {
            return Err(ExecutorError::InsufficientBalance { token });
        }

        set_balance_of(state, from, &token, balance - tx.value)?;
        if let Some(to) = tx.to {
            let recipient = balance_of(state, to, &token)?;
            set_balance_of(state, to, &token, recipient.saturating_add(tx.value))?;
        }
        Ok(())
    }

    /// Trades `value` of the primary token for the secondary through the
    /// built-in pool, constant-product with no fee and truncating division.
    fn swap(state: &mut dyn StateStore, tx: &Transaction, from: Address) -> ExecutorResult<()> {
        let amount_in = tx.value;
        let primary = state.get_balance_primary(from)?;
        if primary < amount_in {
            return Err(ExecutorError::InsufficientBalance { token: PRIMARY_TOKEN.to_string() });
        }

        let mut pool = state.get_pool(POOL_PAIR)?;
        if pool.reserve0.is_zero() {
            return Err(ExecutorError::InsufficientLiquidity);
        }

        // amount_out = reserve1 * amount_in / (reserve0 + amount_in),
        // widened so the intermediate product cannot overflow.
        let numerator = U512::from(pool.reserve1) * U512::from(amount_in);
        let denominator = U512::from(pool.reserve0) + U512::from(amount_in);
        let amount_out = U256::from(numerator / denominator);
        if amount_out.is_zero() {
            return Err(ExecutorError::Slippage);
        }

        state.set_balance_primary(from, primary - amount_in)?;
        let secondary = state.get_balance_secondary(from)?;
        state.set_balance_secondary(from, secondary.saturating_add(amount_out))?;

        pool.reserve0 = pool.reserve0.saturating_add(amount_in);
        pool.reserve1 -= amount_out;
        state.set_pool(POOL_PAIR, &pool)
            .map_err(Into::into)
    }

    /// Deposits `value` of the primary token and a matching secondary amount
    /// into the pool. The secondary amount is the first 32 bytes of `data`
    /// as a big-endian integer, defaulting to 1:1.
    fn add_liquidity(
        state: &mut dyn StateStore,
        tx: &Transaction,
        from: Address,
    ) -> ExecutorResult<()> {
        let amount0 = tx.value;
        let amount1 = if tx.data.len() >= 32 {
            U256::from_be_slice(&tx.data[..32])
        } else {
            amount0
        };

        let primary = state.get_balance_primary(from)?;
        let secondary = state.get_balance_secondary(from)?;
        if primary < amount0 {
            return Err(ExecutorError::InsufficientBalance { token: PRIMARY_TOKEN.to_string() });
        }
        if secondary < amount1 {
            return Err(ExecutorError::InsufficientBalance {
                token: SECONDARY_TOKEN.to_string(),
            });
        }

        state.set_balance_primary(from, primary - amount0)?;
        state.set_balance_secondary(from, secondary - amount1)?;

        let mut pool = state.get_pool(POOL_PAIR)?;
        pool.reserve0 = pool.reserve0.saturating_add(amount0);
        pool.reserve1 = pool.reserve1.saturating_add(amount1);
        // LP shares track the primary contribution.
        pool.total_supply = pool.total_supply.saturating_add(amount0);
        state.set_pool(POOL_PAIR, &pool)
            .map_err(Into::into)
    }
}

fn balance_of(state: &dyn StateStore, addr: Address, token: &str) -> ExecutorResult<U256> {
    let balance = match token {
        PRIMARY_TOKEN => state.get_balance_primary(addr)?,
        SECONDARY_TOKEN => state.get_balance_secondary(addr)?,
        _ => state.get_balance_token(addr, token)?,
    };
    Ok(balance)
}

fn set_balance_of(
    state: &mut dyn StateStore,
    addr: Address,
    token: &str,
    amount: U256,
) -> ExecutorResult<()> {
    match token {
        PRIMARY_TOKEN => state.set_balance_primary(addr, amount)?,
        SECONDARY_TOKEN => state.set_balance_secondary(addr, amount)?,
        _ => state.set_balance_token(addr, token, amount)?,
    }
    Ok(())
}
