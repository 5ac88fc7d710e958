#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{StateError, StateResult};

mod key;
pub use key::{account_key, block_key, pool_key, storage_key, BLOCK_HEIGHT_KEY};

mod traits;
pub use traits::{SharedStateStore, StateStore};

mod kv;

mod mem;
pub use mem::MemoryStateStore;

mod disk;
pub use disk::DiskStateStore;

mod root;
