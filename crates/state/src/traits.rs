//! The [StateStore] capability set.

use crate::StateResult;
use alloy_primitives::{Address, B256, U256};
use duet_primitives::{Block, Pool};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The flat state interface consumed by the executor, the sequencer and the
/// RPC surface.
///
/// All operations are synchronous and durable on return. Absent keys read as
/// the type's zero value, never as an error. Writers must be serialized by
/// the caller; the sequencer holds the write half of a [SharedStateStore]
/// during block production.
pub trait StateStore: core::fmt::Debug {
    /// Balance of the primary native token.
    fn get_balance_primary(&self, addr: Address) -> StateResult<U256>;
    /// Sets the balance of the primary native token.
    fn set_balance_primary(&mut self, addr: Address, amount: U256) -> StateResult<()>;

    /// Balance of the secondary native token.
    fn get_balance_secondary(&self, addr: Address) -> StateResult<U256>;
    /// Sets the balance of the secondary native token.
    fn set_balance_secondary(&mut self, addr: Address, amount: U256) -> StateResult<()>;

    /// Balance of a general token.
    fn get_balance_token(&self, addr: Address, token: &str) -> StateResult<U256>;
    /// Sets the balance of a general token.
    fn set_balance_token(&mut self, addr: Address, token: &str, amount: U256) -> StateResult<()>;

    /// Account nonce.
    fn get_nonce(&self, addr: Address) -> StateResult<u64>;
    /// Sets the account nonce. Only the executor calls this, with `old + 1`.
    fn set_nonce(&mut self, addr: Address, nonce: u64) -> StateResult<()>;

    /// Reserved contract-storage slot read.
    fn get_storage(&self, addr: Address, slot: B256) -> StateResult<B256>;
    /// Reserved contract-storage slot write.
    fn set_storage(&mut self, addr: Address, slot: B256, value: B256) -> StateResult<()>;

    /// Reserved contract code read.
    fn get_code(&self, addr: Address) -> StateResult<Vec<u8>>;
    /// Reserved contract code write; also records `keccak256(code)` as the
    /// account's code hash.
    fn set_code(&mut self, addr: Address, code: Vec<u8>) -> StateResult<()>;

    /// Reads a pool by pair name; an absent pool reads as [Pool::default].
    fn get_pool(&self, name: &str) -> StateResult<Pool>;
    /// Writes a pool under its pair name.
    fn set_pool(&mut self, name: &str, pool: &Pool) -> StateResult<()>;

    /// Reads a block by number.
    fn get_block(&self, number: u64) -> StateResult<Option<Block>>;
    /// Writes a block under its number.
    fn set_block(&mut self, number: u64, block: &Block) -> StateResult<()>;

    /// The persisted tip height; zero before any block was produced.
    fn block_height(&self) -> StateResult<u64>;
    /// Persists the tip height.
    fn set_block_height(&mut self, height: u64) -> StateResult<()>;

    /// Commits the state and returns its root.
    ///
    /// The root is a deterministic commitment over the account and pool
    /// namespaces: identical write histories produce identical roots across
    /// implementations. It is recorded into block headers and settlement
    /// batches.
    fn commit(&mut self) -> StateResult<B256>;
}

/// A shared, synchronized handle to a [StateStore].
pub type SharedStateStore = Arc<RwLock<dyn StateStore + Send + Sync>>;
