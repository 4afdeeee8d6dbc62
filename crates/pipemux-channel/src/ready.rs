use std::os::fd::BorrowedFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use crate::error::{ChannelError, Result};

/// Outcome of a bounded readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The descriptor has data to read, or its peer end hung up.
    Ready,
    /// The timeout elapsed with nothing to report.
    TimedOut,
}

/// Wait up to `timeout` for `fd` to become readable.
///
/// `POLLHUP` and `POLLERR` count as ready: the caller's next read then
/// observes end-of-stream (zero bytes) or the error, instead of hanging.
/// `EINTR` retries the wait.
pub fn wait_readable(fd: BorrowedFd<'_>, timeout: Duration) -> Result<Readiness> {
    let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
    loop {
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        match poll(&mut fds, millis) {
            Ok(0) => return Ok(Readiness::TimedOut),
            Ok(_) => {
                let revents = fds[0].revents().unwrap_or(PollFlags::empty());
                if revents
                    .intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
                {
                    return Ok(Readiness::Ready);
                }
                return Ok(Readiness::TimedOut);
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ChannelError::Poll(errno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::Channel;
    use std::io::{Read, Write};
    use std::os::fd::AsFd;
    use std::time::Instant;

    #[test]
    fn ready_after_write() {
        let (reader, mut writer) = Channel::new().unwrap().split();

        writer.write_all(b"ping").unwrap();

        let readiness = wait_readable(reader.as_fd(), Duration::from_secs(1)).unwrap();
        assert_eq!(readiness, Readiness::Ready);
    }

    #[test]
    fn times_out_on_idle_pipe() {
        let (reader, _writer) = Channel::new().unwrap().split();

        let start = Instant::now();
        let readiness = wait_readable(reader.as_fd(), Duration::from_millis(20)).unwrap();
        assert_eq!(readiness, Readiness::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn closed_write_end_reports_ready_then_eof() {
        let (mut reader, writer) = Channel::new().unwrap().split();
        drop(writer);

        let readiness = reader.wait_readable(Duration::from_secs(1)).unwrap();
        assert_eq!(readiness, Readiness::Ready);

        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(n, 0, "closed write end must read as end-of-stream");
    }
}
