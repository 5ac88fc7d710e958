//! The L1 settlement [Relayer].

use crate::{Batch, L1Client, SettlementError, SettlementResult};
use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy_rlp::RlpEncodable;
use duet_sequencer::{Clock, SharedSequencer, SystemClock};
use duet_signer::{address_of, parse_signing_key, sign_prehash_eip155};
use k256::ecdsa::SigningKey;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// How often the relayer checks for settleable blocks.
pub const SETTLEMENT_TICK: Duration = Duration::from_secs(10);

/// Gas limit of the L1 settlement transaction.
const SETTLEMENT_GAS: u64 = 100_000;

/// Placeholder relayer identity used in demo mode.
const DEMO_RELAYER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// Configuration of a [Relayer].
#[derive(Debug, Clone)]
pub struct RelayerConfig {
    /// The L1 JSON-RPC endpoint.
    pub l1_rpc_url: String,
    /// Hex-encoded submitter key; absent or the literal `"demo"` selects
    /// demo mode.
    pub submitter_key: Option<String>,
    /// Minimum number of unsettled blocks per batch.
    pub batch_interval: u64,
    /// The L1 settlement contract address.
    pub l1_contract: Address,
}

/// Settlement counters exposed over the node's query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerStats {
    /// Number of recorded batches.
    pub total_batches: u64,
    /// Highest settled block.
    pub last_settled_block: u64,
    /// Total transactions across recorded batches.
    pub total_txs_settled: u64,
    /// Whether settlements are simulated.
    pub demo_mode: bool,
    /// The relayer's L1 identity.
    pub relayer_address: Address,
}

/// Batch history, guarded by the relayer's write lock.
#[derive(Debug, Default)]
struct BatchLog {
    batches: Vec<Batch>,
    last_settled: u64,
}

/// Forms batches over finalized blocks and submits them to L1.
///
/// In demo mode (no submitter key, or the L1 endpoint unreachable at
/// startup) submissions are simulated and always succeed. In real mode a
/// failed submission records nothing, so the same range is retried on the
/// next tick; if the node dies between L1 acceptance and recording, the
/// range may be submitted twice. Settlement is at-least-once.
#[derive(Debug)]
pub struct Relayer {
    sequencer: SharedSequencer,
    l1: Option<Box<dyn L1Client>>,
    key: Option<SigningKey>,
    relayer_address: Address,
    l1_chain_id: u64,
    l1_contract: Address,
    batch_interval: u64,
    demo_mode: bool,
    clock: Arc<dyn Clock>,
    log: RwLock<BatchLog>,
}

/// The EIP-155 signing shape of the legacy L1 settlement transaction.
#[derive(RlpEncodable)]
struct L1TxSigning {
    nonce: u64,
    gas_price: U256,
    gas: u64,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    zero0: u8,
    zero1: u8,
}

/// The signed wire shape of the legacy L1 settlement transaction.
#[derive(RlpEncodable)]
struct L1TxSigned {
    nonce: u64,
    gas_price: U256,
    gas: u64,
    to: Address,
    value: U256,
    data: Bytes,
    v: U256,
    r: U256,
    s: U256,
}

impl Relayer {
    /// Creates a [Relayer] from config, probing the L1 endpoint and falling
    /// back to demo mode if the key is absent/`"demo"` or the probe fails.
    pub async fn new(sequencer: SharedSequencer, config: RelayerConfig) -> Self {
        let key = config
            .submitter_key
            .clone()
            .filter(|k| k != "demo" && !k.is_empty())
            .and_then(|k| match parse_signing_key(&k) {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(target: "relayer", %err, "ignoring unparseable submitter key");
                    None
                }
            });
        let client: Option<Box<dyn L1Client>> = key.is_some().then(|| {
            Box::new(crate::HttpL1Client::new(config.l1_rpc_url.clone())) as Box<dyn L1Client>
        });
        Self::with_client(sequencer, client, key, config, Arc::new(SystemClock)).await
    }

    /// [Relayer::new] with an injected [L1Client] and [Clock].
    pub async fn with_client(
        sequencer: SharedSequencer,
        client: Option<Box<dyn L1Client>>,
        key: Option<SigningKey>,
        config: RelayerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (demo_mode, l1_chain_id) = match (&key, &client) {
            (Some(_), Some(client)) => match client.chain_id().await {
                Ok(id) => (false, id),
                Err(err) => {
                    warn!(
                        target: "relayer",
                        %err, "could not reach L1; running in demo mode"
                    );
                    (true, 0)
                }
            },
            _ => (true, 0),
        };
        let relayer_address = key.as_ref().map(address_of).unwrap_or(DEMO_RELAYER);
        info!(
            target: "relayer",
            batch_interval = config.batch_interval,
            demo_mode,
            %relayer_address,
            "settlement relayer ready"
        );

        Self {
            sequencer,
            l1: client,
            key,
            relayer_address,
            l1_chain_id,
            l1_contract: config.l1_contract,
            batch_interval: config.batch_interval,
            demo_mode,
            clock,
            log: RwLock::new(BatchLog::default()),
        }
    }

    /// Whether settlements are simulated.
    pub const fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// One settlement round: settle `[last_settled + 1, tip]` when at least
    /// `batch_interval` blocks are unsettled. Errors are logged; the range
    /// stays unsettled and is retried next tick.
    pub async fn tick(&self) {
        let tip = self.sequencer.read().await.current_height().saturating_sub(1);
        let last_settled = self.log.read().await.last_settled;
        if tip <= last_settled || tip - last_settled < self.batch_interval {
            return;
        }

        match self.settle_range(last_settled + 1, tip).await {
            Ok(batch) => {
                info!(
                    target: "relayer",
                    batch = batch.batch_number,
                    start = batch.start_block,
                    end = batch.end_block,
                    txs = batch.tx_count,
                    root = %batch.state_root,
                    "settled batch"
                );
            }
            Err(err) => warn!(target: "relayer", %err, "settlement failed"),
        }
    }

    /// Immediately settles everything past `last_settled`, regardless of the
    /// batch interval.
    pub async fn force_settle(&self) -> SettlementResult<Batch> {
        let tip = self.sequencer.read().await.current_height().saturating_sub(1);
        let last_settled = self.log.read().await.last_settled;
        if tip <= last_settled {
            return Err(SettlementError::NoNewBlocks);
        }
        self.settle_range(last_settled + 1, tip).await
    }

    /// All recorded batches, oldest first.
    pub async fn get_batches(&self) -> Vec<Batch> {
        self.log.read().await.batches.clone()
    }

    /// The most recently recorded batch.
    pub async fn get_latest_batch(&self) -> Option<Batch> {
        self.log.read().await.batches.last().cloned()
    }

    /// Settlement counters.
    pub async fn get_stats(&self) -> RelayerStats {
        let log = self.log.read().await;
        RelayerStats {
            total_batches: log.batches.len() as u64,
            last_settled_block: log.last_settled,
            total_txs_settled: log.batches.iter().map(|b| b.tx_count).sum(),
            demo_mode: self.demo_mode,
            relayer_address: self.relayer_address,
        }
    }

    /// Builds, submits and records the batch covering `[start, end]`. The
    /// batch is only recorded after a successful submission.
    async fn settle_range(&self, start: u64, end: u64) -> SettlementResult<Batch> {
        let batch = self.build_batch(start, end).await?;
        let batch = self.submit(batch).await?;

        let mut log = self.log.write().await;
        log.batches.push(batch.clone());
        log.last_settled = end;
        Ok(batch)
    }

    async fn build_batch(&self, start: u64, end: u64) -> SettlementResult<Batch> {
        let mut state_root = B256::ZERO;
        let mut tx_count = 0u64;
        {
            let sequencer = self.sequencer.read().await;
            for number in start..=end {
                if let Some(block) = sequencer.get_block(number).await? {
                    state_root = block.header.state_root;
                    tx_count += block.transactions.len() as u64;
                }
            }
        }

        Ok(Batch {
            batch_number: self.log.read().await.batches.len() as u64 + 1,
            start_block: start,
            end_block: end,
            state_root,
            tx_count,
            timestamp: self.clock.now(),
            ..Default::default()
        })
    }

    async fn submit(&self, mut batch: Batch) -> SettlementResult<Batch> {
        if self.demo_mode {
            let mut preimage = Vec::with_capacity(8 + 8 + 32);
            preimage.extend_from_slice(&batch.batch_number.to_be_bytes());
            preimage.extend_from_slice(&batch.timestamp.to_be_bytes());
            preimage.extend_from_slice(batch.state_root.as_slice());
            batch.settled_tx_hash = Some(keccak256(&preimage));
            batch.l1_block_number = Some(batch.timestamp % 1_000_000);
            batch.settled_on_l1 = true;
            return Ok(batch);
        }

        let client = self.l1.as_ref().ok_or(SettlementError::L1NotConnected)?;
        let key = self.key.as_ref().ok_or(SettlementError::L1NotConnected)?;

        let nonce = client
            .pending_nonce_at(self.relayer_address)
            .await
            .map_err(|err| SettlementError::L1SubmitFailed(err.to_string()))?;
        let gas_price = client
            .suggest_gas_price()
            .await
            .map_err(|err| SettlementError::L1SubmitFailed(err.to_string()))?;

        // data = state_root || be(start_block) || be(end_block)
        let mut data = Vec::with_capacity(32 + 8 + 8);
        data.extend_from_slice(batch.state_root.as_slice());
        data.extend_from_slice(&batch.start_block.to_be_bytes());
        data.extend_from_slice(&batch.end_block.to_be_bytes());
        let data = Bytes::from(data);

        let signing = L1TxSigning {
            nonce,
            gas_price,
            gas: SETTLEMENT_GAS,
            to: self.l1_contract,
            value: U256::ZERO,
            data: data.clone(),
            chain_id: self.l1_chain_id,
            zero0: 0,
            zero1: 0,
        };
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&signing, &mut buf);
        let (v, r, s) = sign_prehash_eip155(key, keccak256(&buf), self.l1_chain_id)
            .map_err(|err| SettlementError::L1SubmitFailed(err.to_string()))?;

        let signed = L1TxSigned {
            nonce,
            gas_price,
            gas: SETTLEMENT_GAS,
            to: self.l1_contract,
            value: U256::ZERO,
            data,
            v,
            r,
            s,
        };
        let mut raw = Vec::new();
        alloy_rlp::Encodable::encode(&signed, &mut raw);

        let tx_hash = client
            .send_raw_transaction(Bytes::from(raw))
            .await
            .map_err(|err| SettlementError::L1SubmitFailed(err.to_string()))?;

        batch.settled_tx_hash = Some(tx_hash);
        batch.settled_on_l1 = true;
        Ok(batch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::L1ClientResult;
    use async_trait::async_trait;
    use duet_executor::Executor;
    use duet_mempool::Mempool;
    use duet_primitives::{Transaction, TxType};
    use duet_sequencer::{FixedClock, Sequencer};
    use duet_state::{MemoryStateStore, StateStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    const ALICE: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const CONTRACT: Address = address!("1111111111111111111111111111111111111111");

    /// A scripted [L1Client]: fails every call while `failing` is set.
    #[derive(Debug, Default)]
    struct MockL1Client {
        failing: AtomicBool,
    }

    impl MockL1Client {
        const TX_HASH: B256 = B256::repeat_byte(0x44);

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> L1ClientResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(crate::L1ClientError("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl L1Client for &'static MockL1Client {
        async fn chain_id(&self) -> L1ClientResult<u64> {
            self.check()?;
            Ok(14)
        }

        async fn pending_nonce_at(&self, _addr: Address) -> L1ClientResult<u64> {
            self.check()?;
            Ok(3)
        }

        async fn suggest_gas_price(&self) -> L1ClientResult<U256> {
            self.check()?;
            Ok(U256::from(25_000_000_000u64))
        }

        async fn send_raw_transaction(&self, raw: Bytes) -> L1ClientResult<B256> {
            self.check()?;
            assert!(!raw.is_empty());
            Ok(Self::TX_HASH)
        }
    }

    fn config(batch_interval: u64) -> RelayerConfig {
        RelayerConfig {
            l1_rpc_url: "http://127.0.0.1:8545".to_string(),
            submitter_key: None,
            batch_interval,
            l1_contract: CONTRACT,
        }
    }

    /// A funded single-account chain whose blocks are produced on demand,
    /// one transfer per block.
    struct TestChain {
        state: duet_state::SharedStateStore,
        mempool: duet_mempool::SharedMempool,
        sequencer: SharedSequencer,
    }

    impl TestChain {
        async fn new() -> Self {
            let state: duet_state::SharedStateStore =
                Arc::new(RwLock::new(MemoryStateStore::new()));
            let mempool: duet_mempool::SharedMempool = Arc::new(RwLock::new(Mempool::new()));
            state
                .write()
                .await
                .set_balance_primary(ALICE, U256::from(1_000_000u64))
                .unwrap();

            let executor = Executor::new(state.clone());
            let sequencer = Sequencer::with_clock(
                state.clone(),
                mempool.clone(),
                executor,
                Address::ZERO,
                Arc::new(FixedClock(1_700_000_000)),
            )
            .await
            .unwrap();

            Self { state, mempool, sequencer: Arc::new(RwLock::new(sequencer)) }
        }

        async fn with_blocks(blocks: u64) -> Self {
            let chain = Self::new().await;
            chain.produce(blocks).await;
            chain
        }

        async fn produce(&self, blocks: u64) {
            for _ in 0..blocks {
                let nonce = self.state.read().await.get_nonce(ALICE).unwrap();
                let tx = Transaction {
                    tx_type: TxType::Transfer,
                    nonce,
                    from: Some(ALICE),
                    value: U256::from(1u64),
                    gas_price: Some(U256::from(1u64)),
                    ..Default::default()
                };
                self.mempool.write().await.add(tx).unwrap();
                self.sequencer.write().await.produce_block().await.unwrap();
            }
        }
    }

    async fn demo_relayer(sequencer: SharedSequencer, batch_interval: u64) -> Relayer {
        Relayer::with_client(
            sequencer,
            None,
            None,
            config(batch_interval),
            Arc::new(FixedClock(1_700_000_123)),
        )
        .await
    }

    /// Batch contiguity as the chain grows between ticks, ending with a
    /// forced settlement of the leftover block.
    #[tokio::test]
    async fn batches_are_dense_and_contiguous() {
        let chain = TestChain::new().await;
        let relayer = demo_relayer(chain.sequencer.clone(), 2).await;

        chain.produce(2).await;
        relayer.tick().await;
        chain.produce(2).await;
        relayer.tick().await;
        chain.produce(1).await;
        relayer.tick().await;

        let batches = relayer.get_batches().await;
        assert_eq!(batches.len(), 2);
        assert_eq!((batches[0].start_block, batches[0].end_block), (1, 2));
        assert_eq!((batches[1].start_block, batches[1].end_block), (3, 4));
        assert_eq!(batches[0].batch_number, 1);
        assert_eq!(batches[1].batch_number, 2);
        assert_eq!(relayer.get_stats().await.last_settled_block, 4);

        // The leftover block settles on demand.
        let third = relayer.force_settle().await.unwrap();
        assert_eq!((third.start_block, third.end_block), (5, 5));
        assert_eq!(third.batch_number, 3);
        assert!(matches!(
            relayer.force_settle().await.unwrap_err(),
            SettlementError::NoNewBlocks
        ));
    }

    #[tokio::test]
    async fn tick_skips_below_the_batch_interval() {
        let chain = TestChain::with_blocks(1).await;
        let relayer = demo_relayer(chain.sequencer.clone(), 2).await;

        relayer.tick().await;
        assert!(relayer.get_batches().await.is_empty());
        assert_eq!(relayer.get_stats().await.last_settled_block, 0);

        // force_settle ignores the interval.
        let batch = relayer.force_settle().await.unwrap();
        assert_eq!((batch.start_block, batch.end_block), (1, 1));
        assert_eq!(batch.batch_number, 1);
    }

    #[tokio::test]
    async fn demo_settlement_synthesizes_a_deterministic_hash() {
        let chain = TestChain::with_blocks(2).await;
        let sequencer = chain.sequencer.clone();
        let relayer = demo_relayer(sequencer.clone(), 2).await;

        relayer.tick().await;
        let batch = relayer.get_latest_batch().await.unwrap();
        assert!(batch.settled_on_l1);
        assert_eq!(batch.timestamp, 1_700_000_123);
        assert_eq!(batch.l1_block_number, Some(1_700_000_123 % 1_000_000));

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&1u64.to_be_bytes());
        preimage.extend_from_slice(&batch.timestamp.to_be_bytes());
        preimage.extend_from_slice(batch.state_root.as_slice());
        assert_eq!(batch.settled_tx_hash, Some(keccak256(&preimage)));

        // The batch root pins the last covered block.
        let expected_root = sequencer
            .read()
            .await
            .get_block(batch.end_block)
            .await
            .unwrap()
            .unwrap()
            .header
            .state_root;
        assert_eq!(batch.state_root, expected_root);
    }

    #[tokio::test]
    async fn failed_submission_leaves_the_range_unsettled() {
        let client: &'static MockL1Client = Box::leak(Box::new(MockL1Client::default()));
        client.set_failing(false);

        let sequencer = TestChain::with_blocks(3).await.sequencer;
        let key = duet_signer::parse_signing_key(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let relayer = Relayer::with_client(
            sequencer,
            Some(Box::new(client)),
            Some(key),
            config(1),
            Arc::new(FixedClock(1_700_000_123)),
        )
        .await;
        assert!(!relayer.demo_mode());

        // L1 goes away: submission fails, nothing is recorded.
        client.set_failing(true);
        assert!(matches!(
            relayer.force_settle().await.unwrap_err(),
            SettlementError::L1SubmitFailed(_)
        ));
        assert!(relayer.get_batches().await.is_empty());
        assert_eq!(relayer.get_stats().await.last_settled_block, 0);

        // L1 recovers: the same range settles with the client's tx hash.
        client.set_failing(false);
        let batch = relayer.force_settle().await.unwrap();
        assert_eq!((batch.start_block, batch.end_block), (1, 3));
        assert_eq!(batch.settled_tx_hash, Some(MockL1Client::TX_HASH));
        assert!(batch.settled_on_l1);
        assert_eq!(relayer.get_stats().await.last_settled_block, 3);
    }

    #[tokio::test]
    async fn unreachable_l1_at_startup_means_demo_mode() {
        let client: &'static MockL1Client = Box::leak(Box::new(MockL1Client::default()));
        client.set_failing(true);

        let sequencer = TestChain::new().await.sequencer;
        let key = duet_signer::parse_signing_key(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let relayer = Relayer::with_client(
            sequencer,
            Some(Box::new(client)),
            Some(key),
            config(1),
            Arc::new(FixedClock(0)),
        )
        .await;
        assert!(relayer.demo_mode());
    }

    #[tokio::test]
    async fn stats_aggregate_the_batch_log() {
        let chain = TestChain::with_blocks(4).await;
        let relayer = demo_relayer(chain.sequencer.clone(), 2).await;

        relayer.tick().await;
        let stats = relayer.get_stats().await;
        assert_eq!(stats.total_batches, 1);
        assert_eq!(stats.last_settled_block, 4);
        assert_eq!(stats.total_txs_settled, 4);
        assert!(stats.demo_mode);
        assert_eq!(stats.relayer_address, DEMO_RELAYER);
    }
}
