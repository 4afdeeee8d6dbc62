//! Pipe-multiplexing engine.
//!
//! A [`Supervisor`] forks one producer process per channel: generators emit
//! timestamped messages on a pseudo-random schedule, and an optional relay
//! forwards lines from stdin. The parent becomes the [`MuxReader`], sweeping
//! every read end with bounded readiness waits and teeing the filtered,
//! timestamp-prefixed stream to a log file and stdout. All loops terminate
//! by comparing their own elapsed wall-clock time against the shared run
//! budget; shutdown is cooperative and time-driven.

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod producer;
pub mod reader;
pub mod supervisor;

pub use clock::Epoch;
pub use config::Config;
pub use error::{EngineError, Result};
pub use filter::filter_message;
pub use producer::{run_generator, run_relay, ProducerConfig, ProducerRole};
pub use reader::{MuxReader, RunSummary};
pub use supervisor::{default_roles, Supervisor};
