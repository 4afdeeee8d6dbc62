use nix::errno::Errno;

/// Errors that can occur on pipe channels.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// `pipe(2)` failed. Callers treat this as fatal: without the channel
    /// the process topology is broken.
    #[error("failed to create pipe: {0}")]
    Create(#[source] Errno),

    /// The readiness wait failed.
    #[error("readiness wait failed: {0}")]
    Poll(#[source] Errno),

    /// An I/O error occurred on a pipe end.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// The raw OS error code behind this error, if there is one.
    ///
    /// Used for process exit codes on fatal failures.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ChannelError::Create(errno) | ChannelError::Poll(errno) => Some(*errno as i32),
            ChannelError::Io(err) => err.raw_os_error(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
