#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{SignerError, SignerResult};

mod ecdsa;
pub use ecdsa::{address_of, parse_signing_key, recover_prehash, sign_prehash_eip155};

mod signer;
pub use signer::Signer;
