#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{SettlementError, SettlementResult};

mod batch;
pub use batch::Batch;

mod l1;
pub use l1::{HttpL1Client, L1Client, L1ClientError, L1ClientResult};

mod relayer;
pub use relayer::{Relayer, RelayerConfig, RelayerStats, SETTLEMENT_TICK};
