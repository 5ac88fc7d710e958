#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{SequencerError, SequencerResult};

mod clock;
pub use clock::{Clock, FixedClock, SystemClock};

mod sequencer;
pub use sequencer::{SharedSequencer, Sequencer};
