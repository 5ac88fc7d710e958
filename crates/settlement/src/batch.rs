//! The settlement [Batch] record.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// A contiguous range of L2 blocks pinned to L1 as one record.
///
/// Batches are dense: batch `k` starts one past batch `k-1`'s end, and batch
/// numbers count up from one without gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// 1-based, dense batch number.
    pub batch_number: u64,
    /// First block covered, inclusive.
    pub start_block: u64,
    /// Last block covered, inclusive.
    pub end_block: u64,
    /// State root of the last covered block.
    pub state_root: B256,
    /// Total transactions across the covered blocks.
    pub tx_count: u64,
    /// Seconds since the Unix epoch at batch formation.
    pub timestamp: u64,
    /// Whether the batch has been settled on L1.
    pub settled_on_l1: bool,
    /// Hash of the settlement transaction, once settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_tx_hash: Option<B256>,
    /// L1 block the settlement landed in, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_block_number: Option<u64>,
}
