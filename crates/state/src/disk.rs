//! A durable [StateStore] backed by [rocksdb].
//!
//! [StateStore]: crate::StateStore

use crate::{kv::KeyValueStore, root::StateRootBuilder, StateResult};
use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::{Path, PathBuf};

/// A [StateStore] that persists to a rocksdb database on disk.
///
/// Every write is durable on return; reopening the same data directory after
/// a clean shutdown yields the balances, pools, blocks and tip height that
/// were last written.
///
/// [StateStore]: crate::StateStore
#[derive(Debug)]
pub struct DiskStateStore {
    data_directory: PathBuf,
    db: DB,
}

impl DiskStateStore {
    /// Opens (or creates) the database at the given data directory.
    pub fn open(data_directory: &Path) -> StateResult<Self> {
        let db = DB::open(&Self::db_options(), data_directory)?;
        Ok(Self { data_directory: data_directory.to_path_buf(), db })
    }

    /// The data directory this store was opened with.
    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    /// Gets the [Options] for the underlying rocksdb instance.
    fn db_options() -> Options {
        let mut options = Options::default();
        options.set_compression_type(rocksdb::DBCompressionType::Snappy);
        options.create_if_missing(true);
        options
    }
}

impl KeyValueStore for DiskStateStore {
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> StateResult<()> {
        Ok(self.db.put(key, value)?)
    }

    fn fold_prefix(&self, prefix: &[u8], builder: &mut StateRootBuilder) -> StateResult<()> {
        for entry in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = entry?;
            if !key.starts_with(prefix) {
                break;
            }
            builder.add(&key, &value);
        }
        Ok(())
    }
}
