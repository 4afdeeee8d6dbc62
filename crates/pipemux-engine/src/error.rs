use std::path::PathBuf;

use nix::errno::Errno;
use pipemux_channel::ChannelError;

/// Errors that can occur while running the multiplexing engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A channel operation failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The log file could not be opened. Fatal: the reader exists to
    /// produce this file.
    #[error("failed to open log file {path}: {source}")]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error on one of the output sinks.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `fork(2)` failed while spawning a producer.
    #[error("failed to fork producer: {0}")]
    Fork(#[source] Errno),
}

impl EngineError {
    /// The raw OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            EngineError::Channel(err) => err.raw_os_error(),
            EngineError::LogOpen { source, .. } => source.raw_os_error(),
            EngineError::Io(err) => err.raw_os_error(),
            EngineError::Fork(errno) => Some(*errno as i32),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
