use std::io::{BufRead, ErrorKind, Write};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use pipemux_channel::PipeWriter;

use crate::clock::Epoch;
use crate::config::Config;
use crate::error::Result;

/// Which producer loop a forked child runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerRole {
    /// Emits `"<label> Child <id> message <n>"` lines on a pseudo-random
    /// schedule.
    Generator { id: u32 },
    /// Forwards lines read from an external line-oriented source.
    Relay,
}

/// Parameters a producer loop needs; extracted from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct ProducerConfig {
    /// Wall-clock duration after which the loop ends.
    pub run_budget: Duration,
    /// Maximum generator sleep between messages (whole seconds).
    pub max_sleep: Duration,
    /// Sleep-schedule seed. Fixed by default so timing is reproducible.
    pub seed: u64,
}

impl From<&Config> for ProducerConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            run_budget: cfg.run_budget,
            max_sleep: cfg.max_sleep,
            seed: cfg.seed,
        }
    }
}

/// How long the relay idles when its input has no data before rechecking
/// the budget.
const RELAY_IDLE: Duration = Duration::from_millis(50);

/// Periodic-generator producer loop.
///
/// Each iteration sleeps a deterministic pseudo-random number of whole
/// seconds in `0..=max_sleep`, then writes one timestamped message followed
/// by a trailing NUL (the reader's filter strips it). The budget is checked
/// once per iteration, so the final message may land slightly after the
/// budget nominally expired; that overshoot is accepted.
///
/// Returns once the budget elapses or the read end has gone away. Dropping
/// the writer closes the write end, which signals end-of-stream.
pub fn run_generator(mut writer: PipeWriter, id: u32, cfg: &ProducerConfig) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let max_sleep_secs = cfg.max_sleep.as_secs();
    let epoch = Epoch::now();
    let start = Instant::now();
    let mut message_num = 0u64;

    while start.elapsed() < cfg.run_budget {
        message_num += 1;
        let sleep_secs = rng.gen_range(0..=max_sleep_secs);
        if sleep_secs != 0 {
            std::thread::sleep(Duration::from_secs(sleep_secs));
        }
        let message = format!("{} Child {} message {}\n", epoch.elapsed_label(), id, message_num);
        if write_message(&mut writer, &terminate(message))?.is_none() {
            debug!(id, "read end closed, generator stopping");
            break;
        }
    }

    debug!(id, messages = message_num, "generator done");
    Ok(())
}

/// Stdin-relay producer loop.
///
/// Blockingly reads one line at a time; each line is forwarded as
/// `"<label> <line>"`. End-of-input does not end the loop: the budget is
/// rechecked each iteration (with a short idle pause so a closed source
/// does not spin). A line missing its terminator gets one appended.
pub fn run_relay(
    mut writer: PipeWriter,
    mut input: impl BufRead,
    cfg: &ProducerConfig,
) -> Result<()> {
    let epoch = Epoch::now();
    let start = Instant::now();
    let mut message_num = 0u64;
    let mut line = String::new();

    while start.elapsed() < cfg.run_budget {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                std::thread::sleep(RELAY_IDLE);
                continue;
            }
            Ok(_) => {
                message_num += 1;
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                let message = format!("{} {}", epoch.elapsed_label(), line);
                if write_message(&mut writer, message.as_bytes())?.is_none() {
                    debug!("read end closed, relay stopping");
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    debug!(messages = message_num, "relay done");
    Ok(())
}

/// Write one whole message, treating a vanished reader as a clean stop.
///
/// Returns `Ok(Some(()))` on success and `Ok(None)` when the read end is
/// closed (`EPIPE` / zero-length write), which ends the producer's run.
fn write_message(writer: &mut PipeWriter, bytes: &[u8]) -> Result<Option<()>> {
    match writer.write_all(bytes) {
        Ok(()) => Ok(Some(())),
        Err(err)
            if err.kind() == ErrorKind::BrokenPipe || err.kind() == ErrorKind::WriteZero =>
        {
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Append the on-wire NUL terminator to a formatted message.
fn terminate(message: String) -> Vec<u8> {
    let mut bytes = message.into_bytes();
    bytes.push(0);
    bytes
}
