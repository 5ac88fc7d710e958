//! The block-producing [Sequencer].

use crate::{Clock, SequencerError, SequencerResult, SystemClock};
use alloy_primitives::{Address, B256};
use duet_executor::Executor;
use duet_mempool::SharedMempool;
use duet_primitives::{Block, Header, TX_GAS_USED};
use duet_state::SharedStateStore;
use lru::LruCache;
use std::{num::NonZeroUsize, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, warn};

/// Most-recent blocks kept in memory; misses fall through to the store.
const BLOCK_CACHE_SIZE: usize = 100;

/// Upper bound on transactions drained from the mempool per block.
const MAX_BLOCK_TXS: usize = 100;

/// The single-node block producer.
///
/// Holds the only write path into account and pool state: a block is
/// produced by executing a mempool prefix in admission order, committing
/// state, and persisting the sealed block before the tip advances.
#[derive(Debug)]
pub struct Sequencer {
    state: SharedStateStore,
    mempool: SharedMempool,
    executor: Executor,
    coinbase: Address,
    /// Cache of recently produced blocks, keyed by number.
    cache: LruCache<u64, Block>,
    /// The number the next produced block will carry.
    next_block_number: u64,
    clock: Arc<dyn Clock>,
}

/// A shared, synchronized handle to a [Sequencer]. `produce_block` holds the
/// write half for a whole production round; queries take the read half.
pub type SharedSequencer = Arc<RwLock<Sequencer>>;

impl Sequencer {
    /// Creates a [Sequencer] over the given state, mempool and executor,
    /// resuming from the persisted tip height if one exists.
    pub async fn new(
        state: SharedStateStore,
        mempool: SharedMempool,
        executor: Executor,
        coinbase: Address,
    ) -> SequencerResult<Self> {
        Self::with_clock(state, mempool, executor, coinbase, Arc::new(SystemClock)).await
    }

    /// [Sequencer::new] with an injected [Clock], for replayable tests.
    pub async fn with_clock(
        state: SharedStateStore,
        mempool: SharedMempool,
        executor: Executor,
        coinbase: Address,
        clock: Arc<dyn Clock>,
    ) -> SequencerResult<Self> {
        let mut cache = LruCache::new(NonZeroUsize::new(BLOCK_CACHE_SIZE).expect("non-zero"));

        let stored = state.read().await.block_height()?;
        let next_block_number = if stored > 0 {
            // Warm the cache with the most recent blocks, oldest first so the
            // newest survive eviction.
            let first = stored.saturating_sub(BLOCK_CACHE_SIZE as u64 - 1).max(1);
            let store = state.read().await;
            for number in first..=stored {
                if let Some(block) = store.get_block(number)? {
                    cache.put(number, block);
                }
            }
            stored + 1
        } else {
            1
        };

        Ok(Self { state, mempool, executor, coinbase, cache, next_block_number, clock })
    }

    /// The next block number to be produced; the tip is one below.
    pub const fn current_height(&self) -> u64 {
        self.next_block_number
    }

    /// The sequencer's coinbase address, stamped into produced headers.
    pub const fn coinbase(&self) -> Address {
        self.coinbase
    }

    /// Returns a block by number, from the cache or the store.
    pub async fn get_block(&self, number: u64) -> SequencerResult<Option<Block>> {
        if let Some(block) = self.cache.peek(&number) {
            return Ok(Some(block.clone()));
        }
        Ok(self.state.read().await.get_block(number)?)
    }

    /// Returns up to `n` most recent blocks, newest first.
    pub async fn get_latest_blocks(&self, n: usize) -> SequencerResult<Vec<Block>> {
        let mut blocks = Vec::with_capacity(n.min(self.next_block_number as usize));
        let mut number = self.next_block_number.saturating_sub(1);
        while number > 0 && blocks.len() < n {
            if let Some(block) = self.get_block(number).await? {
                blocks.push(block);
            }
            number -= 1;
        }
        Ok(blocks)
    }

    /// Produces one block from the current mempool prefix.
    ///
    /// Transactions execute in admission order; one that fails is dropped
    /// from the block (not retried, not kept in the mempool). The whole
    /// round runs under the sequencer's write lock and is not interruptible
    /// between execution and the mempool pop.
    pub async fn produce_block(&mut self) -> SequencerResult<Block> {
        // 1. Snapshot the pending prefix.
        let pending = self.mempool.read().await.peek(MAX_BLOCK_TXS);
        if pending.is_empty() {
            return Err(SequencerError::NoPendingTxs);
        }

        // 2. Execute in order, keeping the survivors.
        let mut valid_txs = Vec::with_capacity(pending.len());
        for tx in &pending {
            let Some(from) = tx.from else {
                warn!(target: "sequencer", hash = %tx.hash(), "skipping tx with no sender");
                continue;
            };
            match self.executor.execute(tx, from).await {
                Ok(()) => valid_txs.push(tx.clone()),
                Err(err) => {
                    warn!(target: "sequencer", hash = %tx.hash(), %err, "dropping failed tx");
                }
            }
        }

        // 3. Nothing survived: drain the prefix so it is not retried.
        if valid_txs.is_empty() {
            self.mempool.write().await.pop(pending.len());
            return Err(SequencerError::AllFailed);
        }

        // 4. Link to the parent; the first block has a zero parent hash.
        let number = self.next_block_number;
        let parent_hash = if number > 1 {
            self.get_block(number - 1).await?.map(|b| b.header.hash()).unwrap_or(B256::ZERO)
        } else {
            B256::ZERO
        };

        // 5.-6. Seal the header over the committed state.
        let mut header = Header {
            parent_hash,
            number,
            timestamp: self.clock.now(),
            coinbase: self.coinbase,
            gas_used: TX_GAS_USED * valid_txs.len() as u64,
            ..Default::default()
        };
        {
            let mut state = self.state.write().await;
            match state.commit() {
                Ok(root) => header.state_root = root,
                Err(err) => error!(target: "sequencer", %err, "state commit failed"),
            }
        }
        let block = Block::new(header, valid_txs);

        // 7.-8. Persist; failures are logged and the cache stays the source
        // of truth until the next successful persist.
        {
            let mut state = self.state.write().await;
            let persisted = state
                .set_block(number, &block)
                .and_then(|()| state.set_block_height(number));
            if let Err(err) = persisted {
                error!(target: "sequencer", number, %err, "failed to persist block");
            }
        }
        self.cache.put(number, block.clone());

        // 9.-10. Drain the executed prefix and advance the tip.
        self.mempool.write().await.pop(pending.len());
        self.next_block_number += 1;

        Ok(block)
    }
}
