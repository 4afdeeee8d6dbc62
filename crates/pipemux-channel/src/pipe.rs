use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use tracing::debug;

use crate::error::{ChannelError, Result};
use crate::ready::{wait_readable, Readiness};

/// One unidirectional byte channel backed by a `pipe(2)` pair.
///
/// A channel starts with both ends open. Role assignment happens by claiming
/// an end: [`Channel::into_reader`] and [`Channel::into_writer`] consume the
/// channel and drop (close) the opposite end, so a process only ever holds
/// the end it operates. Every end is closed when dropped.
#[derive(Debug)]
pub struct Channel {
    reader: PipeReader,
    writer: PipeWriter,
}

impl Channel {
    /// Create a new pipe channel.
    pub fn new() -> Result<Self> {
        let (read_fd, write_fd) = nix::unistd::pipe().map_err(ChannelError::Create)?;
        Ok(Self {
            reader: PipeReader {
                file: File::from(read_fd),
            },
            writer: PipeWriter {
                file: File::from(write_fd),
            },
        })
    }

    /// Claim the read end, closing the write end.
    pub fn into_reader(self) -> PipeReader {
        self.reader
    }

    /// Claim the write end, closing the read end.
    pub fn into_writer(self) -> PipeWriter {
        self.writer
    }

    /// Claim both ends, for in-process use.
    pub fn split(self) -> (PipeReader, PipeWriter) {
        (self.reader, self.writer)
    }
}

/// Create `n` independent channels.
///
/// Fails on the first `pipe(2)` error; channels created so far are closed on
/// drop. Callers treat failure as fatal.
pub fn create_channels(n: usize) -> Result<Vec<Channel>> {
    let mut channels = Vec::with_capacity(n);
    for _ in 0..n {
        channels.push(Channel::new()?);
    }
    debug!(count = n, "created pipe channels");
    Ok(channels)
}

/// The read end of a channel.
#[derive(Debug)]
pub struct PipeReader {
    file: File,
}

impl PipeReader {
    /// Wait until the pipe has data (or a closed write end) to report,
    /// up to `timeout`.
    ///
    /// A hung-up pipe reports [`Readiness::Ready`] so the caller observes
    /// end-of-stream through a zero-byte read instead of blocking forever.
    pub fn wait_readable(&self, timeout: Duration) -> Result<Readiness> {
        wait_readable(self.file.as_fd(), timeout)
    }
}

impl AsFd for PipeReader {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

/// The write end of a channel.
#[derive(Debug)]
pub struct PipeWriter {
    file: File,
}

impl AsFd for PipeWriter {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // Pipe writes are unbuffered.
        Ok(())
    }
}
