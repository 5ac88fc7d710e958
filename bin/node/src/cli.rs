//! This module contains all CLI-specific code for the node binary.

use alloy_primitives::{address, Address};
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use std::{path::PathBuf, str::FromStr};
use tracing::Level;

/// Default sequencer coinbase address.
const DEFAULT_COINBASE: Address = address!("9999999999999999999999999999999999999999");

/// Default bootstrap address seeded with genesis balances and liquidity
/// (the address of the well-known Foundry development key #0).
const DEFAULT_BOOTSTRAP: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// The node binary CLI application arguments.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct NodeCli {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count)]
    pub v: u8,
    /// Chain identifier used by the transaction signer.
    #[clap(long, default_value_t = 42069)]
    pub network_id: u64,
    /// Data directory of the durable state store.
    #[clap(long, env = "DUET_DATA_DIR", default_value = ".duet/data")]
    pub data_dir: PathBuf,
    /// Port the external JSON-RPC surface binds to.
    #[clap(long, default_value_t = 8545)]
    pub http_port: u16,
    /// Seconds between block production ticks.
    #[clap(long, default_value_t = 3)]
    pub block_period: u64,
    /// Minimum number of L2 blocks per settlement batch.
    #[clap(long, default_value_t = 2)]
    pub settlement_interval: u64,
    /// Address of the L1 JSON-RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub l1_rpc_url: String,
    /// Hex-encoded L1 submitter key; absent or `demo` simulates settlement.
    #[clap(long, env = "DUET_L1_SUBMITTER_KEY", default_value = "demo")]
    pub l1_submitter_key: String,
    /// Address of the L1 settlement contract.
    #[clap(long, value_parser = parse_address, default_value_t = Address::ZERO)]
    pub l1_contract: Address,
    /// Coinbase address stamped into produced blocks.
    #[clap(long, value_parser = parse_address, default_value_t = DEFAULT_COINBASE)]
    pub coinbase: Address,
    /// Address funded and used to seed the genesis liquidity pool.
    #[clap(long, value_parser = parse_address, default_value_t = DEFAULT_BOOTSTRAP)]
    pub bootstrap_address: Address,
    /// Run against an in-memory state store instead of the data directory.
    #[clap(long)]
    pub in_memory: bool,
}

/// Parse a string slice into [Address].
pub(crate) fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("Invalid address value: {s}"))
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
pub fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
