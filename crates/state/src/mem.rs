//! An in-memory [StateStore] for tests and development.
//!
//! [StateStore]: crate::StateStore

use crate::{kv::KeyValueStore, root::StateRootBuilder, StateResult};
use std::collections::BTreeMap;

/// A [StateStore] backed by an ordered in-memory map.
///
/// Shares the keyspace layout and root computation with [DiskStateStore], so
/// the two are interchangeable in tests. `commit` hashes the live map; there
/// is no durability.
///
/// [StateStore]: crate::StateStore
/// [DiskStateStore]: crate::DiskStateStore
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStore {
    store: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStateStore {
    /// Creates an empty [MemoryStateStore].
    pub const fn new() -> Self {
        Self { store: BTreeMap::new() }
    }
}

impl KeyValueStore for MemoryStateStore {
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>> {
        Ok(self.store.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> StateResult<()> {
        self.store.insert(key.to_vec(), value);
        Ok(())
    }

    fn fold_prefix(&self, prefix: &[u8], builder: &mut StateRootBuilder) -> StateResult<()> {
        for (key, value) in self.store.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            builder.add(key, value);
        }
        Ok(())
    }
}
