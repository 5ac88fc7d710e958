#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod cli;
pub use cli::{init_tracing_subscriber, NodeCli};

pub mod node;
pub use node::Node;
