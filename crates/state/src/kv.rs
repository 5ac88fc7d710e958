//! Account-level state logic over a raw key-value backend.
//!
//! Both store implementations only provide byte-oriented primitives; the
//! whole [StateStore] surface is derived from them here so the disk and
//! in-memory stores cannot drift apart.

use crate::{
    key::{account_key, block_key, pool_key, storage_key, BLOCK_HEIGHT_KEY},
    key::{ACCOUNT_PREFIX, POOL_PREFIX},
    root::StateRootBuilder,
    StateResult, StateStore,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use duet_primitives::{Account, Block, Pool};

/// A minimal, synchronous key-value backend.
pub(crate) trait KeyValueStore: core::fmt::Debug {
    /// Get the value associated with the given key.
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>>;

    /// Set the value associated with the given key.
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> StateResult<()>;

    /// Feeds every `(key, value)` entry under `prefix`, in bytewise key
    /// order, into the given root builder.
    fn fold_prefix(&self, prefix: &[u8], builder: &mut StateRootBuilder) -> StateResult<()>;
}

fn read_account<T: KeyValueStore + ?Sized>(kv: &T, addr: Address) -> StateResult<Account> {
    match kv.get(&account_key(addr))? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(Account::default()),
    }
}

fn write_account<T: KeyValueStore + ?Sized>(
    kv: &mut T,
    addr: Address,
    account: &Account,
) -> StateResult<()> {
    kv.set(&account_key(addr), serde_json::to_vec(account)?)
}

impl<T: KeyValueStore> StateStore for T {
    fn get_balance_primary(&self, addr: Address) -> StateResult<U256> {
        Ok(read_account(self, addr)?.balance_primary)
    }

    fn set_balance_primary(&mut self, addr: Address, amount: U256) -> StateResult<()> {
        let mut account = read_account(self, addr)?;
        account.balance_primary = amount;
        write_account(self, addr, &account)
    }

    fn get_balance_secondary(&self, addr: Address) -> StateResult<U256> {
        Ok(read_account(self, addr)?.balance_secondary)
    }

    fn set_balance_secondary(&mut self, addr: Address, amount: U256) -> StateResult<()> {
        let mut account = read_account(self, addr)?;
        account.balance_secondary = amount;
        write_account(self, addr, &account)
    }

    fn get_balance_token(&self, addr: Address, token: &str) -> StateResult<U256> {
        Ok(read_account(self, addr)?.token_balance(token))
    }

    fn set_balance_token(&mut self, addr: Address, token: &str, amount: U256) -> StateResult<()> {
        let mut account = read_account(self, addr)?;
        account.token_balances.insert(token.to_string(), amount);
        write_account(self, addr, &account)
    }

    fn get_nonce(&self, addr: Address) -> StateResult<u64> {
        Ok(read_account(self, addr)?.nonce)
    }

    fn set_nonce(&mut self, addr: Address, nonce: u64) -> StateResult<()> {
        let mut account = read_account(self, addr)?;
        account.nonce = nonce;
        write_account(self, addr, &account)
    }

    fn get_storage(&self, addr: Address, slot: B256) -> StateResult<B256> {
        Ok(self
            .get(&storage_key(addr, slot))?
            .map(|value| B256::left_padding_from(&value[..value.len().min(32)]))
            .unwrap_or_default())
    }

    fn set_storage(&mut self, addr: Address, slot: B256, value: B256) -> StateResult<()> {
        self.set(&storage_key(addr, slot), value.to_vec())
    }

    fn get_code(&self, addr: Address) -> StateResult<Vec<u8>> {
        Ok(read_account(self, addr)?.code.to_vec())
    }

    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> StateResult<()> {
        let mut account = read_account(self, addr)?;
        account.code_hash = keccak256(&code);
        account.code = Bytes::from(code);
        write_account(self, addr, &account)
    }

    fn get_pool(&self, name: &str) -> StateResult<Pool> {
        match self.get(&pool_key(name))? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Pool::default()),
        }
    }

    fn set_pool(&mut self, name: &str, pool: &Pool) -> StateResult<()> {
        self.set(&pool_key(name), serde_json::to_vec(pool)?)
    }

    fn get_block(&self, number: u64) -> StateResult<Option<Block>> {
        self.get(&block_key(number))?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
            .transpose()
    }

    fn set_block(&mut self, number: u64, block: &Block) -> StateResult<()> {
        self.set(&block_key(number), serde_json::to_vec(block)?)
    }

    fn block_height(&self) -> StateResult<u64> {
        Ok(self
            .get(BLOCK_HEIGHT_KEY)?
            .map(|value| U256::from_be_slice(&value).saturating_to::<u64>())
            .unwrap_or_default())
    }

    fn set_block_height(&mut self, height: u64) -> StateResult<()> {
        self.set(BLOCK_HEIGHT_KEY, U256::from(height).to_be_bytes::<32>().to_vec())
    }

    fn commit(&mut self) -> StateResult<B256> {
        let mut builder = StateRootBuilder::new();
        self.fold_prefix(ACCOUNT_PREFIX, &mut builder)?;
        self.fold_prefix(POOL_PREFIX, &mut builder)?;
        Ok(builder.finish())
    }
}
