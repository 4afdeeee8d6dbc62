//! Unidirectional pipe channels for process-to-process byte streams.
//!
//! A [`Channel`] wraps one `pipe(2)` pair. Channels are created before the
//! producer processes fork so both ends are inherited; each side then claims
//! the end it owns, which closes the other end immediately.
//!
//! This is the lowest layer of pipemux. The multiplexing engine builds on
//! the [`PipeReader`] and [`PipeWriter`] types provided here.

pub mod error;
pub mod pipe;
pub mod ready;

pub use error::{ChannelError, Result};
pub use pipe::{create_channels, Channel, PipeReader, PipeWriter};
pub use ready::Readiness;
