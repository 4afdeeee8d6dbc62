use std::sync::atomic::AtomicBool;

use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{fork, ForkResult, Pid};
use tracing::{debug, error, warn};

use pipemux_channel::{create_channels, Channel};

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::producer::{run_generator, run_relay, ProducerConfig, ProducerRole};
use crate::reader::{MuxReader, RunSummary};

/// Role assignment for `n` producers: generators numbered from 1, with the
/// last producer relaying stdin when `relay_last` is set.
pub fn default_roles(n: usize, relay_last: bool) -> Vec<ProducerRole> {
    (0..n)
        .map(|i| {
            if relay_last && i == n - 1 {
                ProducerRole::Relay
            } else {
                ProducerRole::Generator { id: i as u32 + 1 }
            }
        })
        .collect()
}

/// Forks one producer process per channel and runs the multiplexing reader
/// in the original process.
///
/// Channels are created before any fork so both ends are inherited; each
/// child claims its write end (closing everything else it inherited), and
/// the parent claims every read end. After the reader returns, the parent
/// blocks reaping every child pid.
pub struct Supervisor {
    cfg: Config,
}

impl Supervisor {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Run the full topology. Returns the reader's summary.
    ///
    /// A failed fork fails fast: children spawned before the failure are not
    /// killed, they terminate on their own run budget. Clearing `running`
    /// stops the reader at its next sweep check.
    pub fn run(&self, running: &AtomicBool) -> Result<RunSummary> {
        let roles = default_roles(self.cfg.producers, self.cfg.relay_stdin);
        let mut channels = create_channels(roles.len())?;
        debug!(producers = roles.len(), "spawning producers");

        let mut pids = Vec::with_capacity(roles.len());
        for (idx, role) in roles.iter().enumerate() {
            // SAFETY: the child immediately drops into `run_child`, touches
            // only its own channel and the producer loop, and leaves via
            // `_exit` without returning to the caller.
            match unsafe { fork() }.map_err(EngineError::Fork)? {
                ForkResult::Parent { child } => pids.push(child),
                ForkResult::Child => {
                    let code = run_child(&mut channels, idx, *role, &self.cfg);
                    // SAFETY: terminating the child without running the
                    // parent's atexit machinery or flushing inherited
                    // stdio buffers twice.
                    unsafe { libc::_exit(code) }
                }
            }
        }

        let readers = channels.into_iter().map(Channel::into_reader).collect();
        let mut reader = MuxReader::open(readers, &self.cfg)?;
        let summary = reader.run(running)?;

        reap(&pids);
        Ok(summary)
    }
}

/// Child-side setup and producer loop. Never returns control to the fork
/// site; the caller `_exit`s with the returned code.
fn run_child(channels: &mut Vec<Channel>, idx: usize, role: ProducerRole, cfg: &Config) -> i32 {
    // The CLI's ctrl-c handler thread does not exist in the child; restore
    // the default disposition so SIGINT terminates producers directly.
    // SAFETY: SigDfl installs no handler function.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
    }

    let channel = channels.swap_remove(idx);
    // Close every other inherited descriptor so per-channel end-of-stream
    // tracks this child alone.
    channels.clear();
    let writer = channel.into_writer();

    let producer_cfg = ProducerConfig::from(cfg);
    let result = match role {
        ProducerRole::Generator { id } => run_generator(writer, id, &producer_cfg),
        ProducerRole::Relay => run_relay(writer, std::io::stdin().lock(), &producer_cfg),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!(?role, error = %err, "producer failed");
            1
        }
    }
}

/// Blocking reap of every spawned producer. Reap failures are logged; a
/// missing child must not turn a completed run into an error.
fn reap(pids: &[Pid]) {
    for &pid in pids {
        match waitpid(pid, None) {
            Ok(status) => debug!(%pid, ?status, "reaped producer"),
            Err(errno) => warn!(%pid, error = %errno, "waitpid failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_number_generators_from_one() {
        let roles = default_roles(3, false);
        assert_eq!(
            roles,
            vec![
                ProducerRole::Generator { id: 1 },
                ProducerRole::Generator { id: 2 },
                ProducerRole::Generator { id: 3 },
            ]
        );
    }

    #[test]
    fn last_role_is_relay_when_enabled() {
        let roles = default_roles(5, true);
        assert_eq!(roles.len(), 5);
        assert_eq!(roles[3], ProducerRole::Generator { id: 4 });
        assert_eq!(roles[4], ProducerRole::Relay);
    }

    #[test]
    fn single_producer_with_relay_is_just_the_relay() {
        assert_eq!(default_roles(1, true), vec![ProducerRole::Relay]);
        assert_eq!(
            default_roles(1, false),
            vec![ProducerRole::Generator { id: 1 }]
        );
    }
}
