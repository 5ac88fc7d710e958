#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::B256;
use duet_primitives::Transaction;
use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::RwLock;

/// An error raised by the [Mempool].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// The transaction is already pending.
    #[error("transaction already in mempool: {0}")]
    TxExists(B256),
}

/// A [Result] type for the [MempoolError] enum.
pub type MempoolResult<T> = Result<T, MempoolError>;

/// A FIFO staging area for pending transactions.
///
/// Admission validation (signature, nonce, gas funding) is the caller's
/// responsibility at the RPC boundary; the pool itself only rejects
/// duplicates. Transactions are frozen on admit and leave in the order they
/// arrived. The pool is unbounded.
#[derive(Debug, Default)]
pub struct Mempool {
    /// Pending transactions in admission order.
    queue: VecDeque<Transaction>,
    /// Hashes of pending transactions. Dedup only, never ordering.
    by_hash: HashSet<B256>,
}

impl Mempool {
    /// Creates an empty [Mempool].
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a transaction. A transaction whose hash is already pending is
    /// rejected with [MempoolError::TxExists].
    pub fn add(&mut self, tx: Transaction) -> MempoolResult<()> {
        let hash = tx.hash();
        if !self.by_hash.insert(hash) {
            return Err(MempoolError::TxExists(hash));
        }
        self.queue.push_back(tx);
        Ok(())
    }

    /// Returns the first `min(n, len)` transactions without removing them.
    pub fn peek(&self, n: usize) -> Vec<Transaction> {
        self.queue.iter().take(n).cloned().collect()
    }

    /// Removes the first `min(k, len)` transactions and their index entries.
    pub fn pop(&mut self, k: usize) {
        for _ in 0..k.min(self.queue.len()) {
            if let Some(tx) = self.queue.pop_front() {
                self.by_hash.remove(&tx.hash());
            }
        }
    }

    /// The number of pending transactions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// A shared, synchronized handle to a [Mempool]. `add`/`pop` go through the
/// write half, `peek`/`len` through the read half.
pub type SharedMempool = Arc<RwLock<Mempool>>;

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::U256;

    fn tx(nonce: u64) -> Transaction {
        Transaction { nonce, value: U256::from(nonce), ..Default::default() }
    }

    #[test]
    fn admission_preserves_fifo_order() {
        let mut pool = Mempool::new();
        for nonce in 0..5 {
            pool.add(tx(nonce)).unwrap();
        }
        let peeked = pool.peek(5);
        let nonces: Vec<u64> = peeked.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut pool = Mempool::new();
        pool.add(tx(1)).unwrap();
        assert_eq!(pool.add(tx(1)).unwrap_err(), MempoolError::TxExists(tx(1).hash()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut pool = Mempool::new();
        pool.add(tx(1)).unwrap();
        pool.add(tx(2)).unwrap();
        assert_eq!(pool.peek(10).len(), 2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.peek(1).len(), 1);
    }

    #[test]
    fn pop_removes_index_entries_too() {
        let mut pool = Mempool::new();
        pool.add(tx(1)).unwrap();
        pool.add(tx(2)).unwrap();
        pool.pop(1);
        assert_eq!(pool.len(), 1);
        // The popped transaction can be admitted again.
        pool.add(tx(1)).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn pop_beyond_len_drains_the_pool() {
        let mut pool = Mempool::new();
        pool.add(tx(1)).unwrap();
        pool.pop(100);
        assert!(pool.is_empty());
    }
}
