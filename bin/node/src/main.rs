#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use anyhow::Result;
use clap::Parser;
use duet_node::{init_tracing_subscriber, Node, NodeCli};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cfg = NodeCli::parse();
    init_tracing_subscriber(cfg.v)?;

    info!(target: "node", network_id = cfg.network_id, "starting duet node");
    let node = Node::init(cfg).await?;
    node.run().await?;

    info!(target: "node", "node stopped");
    Ok(())
}
