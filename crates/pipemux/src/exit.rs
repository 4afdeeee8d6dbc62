use std::fmt;

use pipemux_channel::ChannelError;
use pipemux_engine::EngineError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Fatal resource failures (pipe creation, log-file open) exit with the
/// underlying OS error code; everything else falls back to the generic
/// failure codes.
pub fn engine_error(context: &str, err: EngineError) -> CliError {
    let code = match &err {
        EngineError::Channel(ChannelError::Create(_)) | EngineError::LogOpen { .. } => {
            err.raw_os_error().unwrap_or(FAILURE)
        }
        EngineError::Fork(_) => err.raw_os_error().unwrap_or(INTERNAL),
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn pipe_creation_failure_exits_with_errno() {
        let err = engine_error(
            "spawn failed",
            EngineError::Channel(ChannelError::Create(Errno::EMFILE)),
        );
        assert_eq!(err.code, Errno::EMFILE as i32);
        assert!(err.message.contains("spawn failed"));
    }

    #[test]
    fn log_open_failure_exits_with_errno() {
        let source = std::io::Error::from_raw_os_error(13);
        let err = engine_error(
            "run failed",
            EngineError::LogOpen {
                path: "output.txt".into(),
                source,
            },
        );
        assert_eq!(err.code, 13);
    }

    #[test]
    fn other_engine_errors_map_to_generic_failure() {
        let err = engine_error(
            "run failed",
            EngineError::Io(std::io::Error::other("sink gone")),
        );
        assert_eq!(err.code, FAILURE);
    }
}
