//! Node assembly: wiring the core components and driving their loops.

use crate::NodeCli;
use alloy_primitives::{Address, U256};
use anyhow::Result;
use duet_executor::Executor;
use duet_mempool::{Mempool, SharedMempool};
use duet_primitives::{Transaction, TxType, POOL_PAIR};
use duet_sequencer::{Sequencer, SequencerError, SharedSequencer};
use duet_settlement::{Relayer, RelayerConfig, SETTLEMENT_TICK};
use duet_signer::Signer;
use duet_state::{DiskStateStore, MemoryStateStore, SharedStateStore, StateStore};
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

/// Genesis mint per token: 1,000,000 whole tokens of 10^18 base units.
const GENESIS_MINT_TOKENS: u64 = 1_000_000;

/// Genesis liquidity per side: 500,000 whole tokens.
const GENESIS_LIQUIDITY_TOKENS: u64 = 500_000;

/// Gas limit of the genesis add-liquidity transaction.
const GENESIS_LIQUIDITY_GAS: u64 = 50_000;

/// The assembled node: every core component, wired.
///
/// The RPC and P2P surfaces are external collaborators; they consume the
/// accessors exposed here (read-only state, mempool ingress, sequencer and
/// relayer queries) and are not part of the core.
#[derive(Debug)]
pub struct Node {
    state: SharedStateStore,
    mempool: SharedMempool,
    sequencer: SharedSequencer,
    relayer: Arc<Relayer>,
    signer: Signer,
    block_period: Duration,
}

impl Node {
    /// Builds a node from CLI configuration: opens the state store, seeds
    /// genesis once per data directory, and restores the chain tip.
    pub async fn init(cfg: NodeCli) -> Result<Self> {
        let state: SharedStateStore = if cfg.in_memory {
            Arc::new(RwLock::new(MemoryStateStore::new()))
        } else {
            Arc::new(RwLock::new(DiskStateStore::open(&cfg.data_dir)?))
        };
        let mempool: SharedMempool = Arc::new(RwLock::new(Mempool::new()));
        let executor = Executor::new(state.clone());
        let signer = Signer::new(cfg.network_id);

        bootstrap_genesis(&executor, &state, cfg.bootstrap_address).await?;

        let sequencer: SharedSequencer = Arc::new(RwLock::new(
            Sequencer::new(state.clone(), mempool.clone(), executor, cfg.coinbase).await?,
        ));
        info!(
            target: "node",
            network_id = cfg.network_id,
            height = sequencer.read().await.current_height() - 1,
            "chain state restored"
        );

        let relayer = Arc::new(
            Relayer::new(
                sequencer.clone(),
                RelayerConfig {
                    l1_rpc_url: cfg.l1_rpc_url,
                    submitter_key: Some(cfg.l1_submitter_key),
                    batch_interval: cfg.settlement_interval,
                    l1_contract: cfg.l1_contract,
                },
            )
            .await,
        );

        Ok(Self {
            state,
            mempool,
            sequencer,
            relayer,
            signer,
            block_period: Duration::from_secs(cfg.block_period.max(1)),
        })
    }

    /// Read-only state access for the external RPC surface.
    pub fn state(&self) -> SharedStateStore {
        self.state.clone()
    }

    /// Transaction ingress for the external RPC and P2P surfaces.
    pub fn mempool(&self) -> SharedMempool {
        self.mempool.clone()
    }

    /// Block and tip queries.
    pub fn sequencer(&self) -> SharedSequencer {
        self.sequencer.clone()
    }

    /// Batch queries and forced settlement.
    pub fn relayer(&self) -> Arc<Relayer> {
        self.relayer.clone()
    }

    /// Sender recovery for admission checks.
    pub const fn signer(&self) -> Signer {
        self.signer
    }

    /// Runs the block production and settlement loops until interrupted.
    /// A production round in flight completes before shutdown.
    pub async fn run(self) -> Result<()> {
        let (shutdown, _) = watch::channel(false);

        let producer = tokio::spawn(produce_loop(
            self.sequencer.clone(),
            self.mempool.clone(),
            self.block_period,
            shutdown.subscribe(),
        ));
        let settler =
            tokio::spawn(settle_loop(self.relayer.clone(), shutdown.subscribe()));

        tokio::signal::ctrl_c().await?;
        info!(target: "node", "shutting down");
        let _ = shutdown.send(true);
        let _ = tokio::join!(producer, settler);
        Ok(())
    }
}

/// The block production tick: drains the mempool into a block every period.
/// Quiet ticks (an empty mempool) produce nothing.
async fn produce_loop(
    sequencer: SharedSequencer,
    mempool: SharedMempool,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if mempool.read().await.is_empty() {
                    continue;
                }
                let mut sequencer = sequencer.write().await;
                match sequencer.produce_block().await {
                    Ok(block) => info!(
                        target: "node",
                        number = block.number(),
                        txs = block.transactions.len(),
                        "sealed block"
                    ),
                    Err(SequencerError::NoPendingTxs) => {}
                    Err(SequencerError::AllFailed) => {
                        warn!(target: "node", "all pending transactions failed")
                    }
                    Err(err) => error!(target: "node", %err, "block production failed"),
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}

/// The settlement tick.
async fn settle_loop(relayer: Arc<Relayer>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(SETTLEMENT_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => relayer.tick().await,
            _ = shutdown.changed() => return,
        }
    }
}

/// Seeds the genesis state once per data directory: mints the bootstrap
/// balances and executes a single add-liquidity to open the pool.
async fn bootstrap_genesis(
    executor: &Executor,
    state: &SharedStateStore,
    bootstrap: Address,
) -> Result<()> {
    if !state.read().await.get_pool(POOL_PAIR)?.total_supply.is_zero() {
        return Ok(());
    }
    info!(target: "node", %bootstrap, "seeding genesis state and liquidity pool");

    let one_token = U256::from(10u64).pow(U256::from(18u64));
    let mint = U256::from(GENESIS_MINT_TOKENS) * one_token;
    executor.mint(bootstrap, Some(mint), Some(mint)).await?;
    executor.mint_token(bootstrap, "USDT", mint).await?;

    let nonce = state.read().await.get_nonce(bootstrap)?;
    let seed = Transaction {
        tx_type: TxType::AddLiquidity,
        nonce,
        from: Some(bootstrap),
        value: U256::from(GENESIS_LIQUIDITY_TOKENS) * one_token,
        gas: GENESIS_LIQUIDITY_GAS,
        ..Default::default()
    };
    executor.execute(&seed, bootstrap).await?;

    info!(
        target: "node",
        liquidity = GENESIS_LIQUIDITY_TOKENS,
        "genesis liquidity added"
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::NodeCli;
    use clap::Parser;

    fn mem_cli() -> NodeCli {
        NodeCli::parse_from(["duet-node", "--in-memory"])
    }

    #[tokio::test]
    async fn init_seeds_the_genesis_pool() {
        let node = Node::init(mem_cli()).await.unwrap();

        let one_token = U256::from(10u64).pow(U256::from(18u64));
        let state = node.state();
        let state = state.read().await;
        let pool = state.get_pool(POOL_PAIR).unwrap();
        assert_eq!(pool.reserve0, U256::from(500_000u64) * one_token);
        assert_eq!(pool.reserve1, U256::from(500_000u64) * one_token);
        assert_eq!(pool.total_supply, U256::from(500_000u64) * one_token);

        // The bootstrap account paid gas and liquidity out of its mint.
        let cli = mem_cli();
        let remaining = state.get_balance_primary(cli.bootstrap_address).unwrap();
        assert!(remaining < U256::from(500_000u64) * one_token);
        assert!(remaining > U256::from(499_999u64) * one_token);
        assert_eq!(
            state.get_balance_token(cli.bootstrap_address, "USDT").unwrap(),
            U256::from(1_000_000u64) * one_token
        );
        assert_eq!(state.get_nonce(cli.bootstrap_address).unwrap(), 1);
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let node = Node::init(mem_cli()).await.unwrap();
        let executor = Executor::new(node.state());

        // A second bootstrap over the same state is a no-op.
        let cli = mem_cli();
        bootstrap_genesis(&executor, &node.state(), cli.bootstrap_address).await.unwrap();

        let state = node.state();
        let state = state.read().await;
        let one_token = U256::from(10u64).pow(U256::from(18u64));
        let pool = state.get_pool(POOL_PAIR).unwrap();
        assert_eq!(pool.total_supply, U256::from(500_000u64) * one_token);
        assert_eq!(state.get_nonce(cli.bootstrap_address).unwrap(), 1);
    }

    #[tokio::test]
    async fn the_demo_relayer_is_wired_by_default() {
        let node = Node::init(mem_cli()).await.unwrap();
        assert!(node.relayer().demo_mode());
        assert_eq!(node.signer().chain_id(), 42069);
        assert_eq!(node.sequencer().read().await.current_height(), 1);
        assert!(node.mempool().read().await.is_empty());
    }
}
