#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod params;
pub use params::{
    DEFAULT_GAS_PRICE, POOL_PAIR, PRIMARY_TOKEN, SECONDARY_TOKEN, TX_GAS_USED,
};

pub mod transaction;
pub use transaction::{Transaction, TxType};

pub mod block;
pub use block::{Block, Header};

pub mod account;
pub use account::Account;

pub mod pool;
pub use pool::Pool;
