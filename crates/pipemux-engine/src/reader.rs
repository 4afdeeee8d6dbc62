use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use pipemux_channel::{PipeReader, Readiness};

use crate::clock::Epoch;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::filter::filter_message;

/// Counters reported when a run completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Number of channels the reader swept.
    pub channels: usize,
    /// Reads forwarded to the sinks.
    pub messages_forwarded: u64,
    /// Filtered bytes forwarded to the sinks.
    pub bytes_forwarded: u64,
    /// Readiness waits or reads that failed and were skipped.
    pub read_errors: u64,
}

struct ChannelState {
    reader: PipeReader,
    open: bool,
}

/// The coordinator's multiplexing reader.
///
/// Owns every channel's read end plus the log file. Each loop iteration
/// sweeps the channels sequentially: a bounded readiness wait, then at most
/// one bounded read whose filtered bytes are forwarded, timestamp-prefixed,
/// to both the log file and stdout. The sequential sweep is a deliberate
/// design simplification carried over from the observed behavior; it is not
/// a single combined wait across all descriptors.
pub struct MuxReader {
    channels: Vec<ChannelState>,
    log: File,
    cfg: Config,
}

impl MuxReader {
    /// Take ownership of the read ends and open the log file fresh.
    ///
    /// A log-open failure is fatal to the caller: the reader exists to
    /// produce this file.
    pub fn open(readers: Vec<PipeReader>, cfg: &Config) -> Result<Self> {
        let log = File::create(&cfg.log_path).map_err(|source| EngineError::LogOpen {
            path: cfg.log_path.clone(),
            source,
        })?;
        Ok(Self {
            channels: readers
                .into_iter()
                .map(|reader| ChannelState { reader, open: true })
                .collect(),
            log,
            cfg: cfg.clone(),
        })
    }

    /// Sweep the channels until the run budget elapses, `running` is
    /// cleared, or every channel has reported end-of-stream.
    ///
    /// The very first readiness wait uses the longer first-wait timeout;
    /// every wait after that uses the sweep-wait timeout. Failed waits and
    /// failed reads are logged and skipped; they never end the run.
    pub fn run(&mut self, running: &AtomicBool) -> Result<RunSummary> {
        let epoch = Epoch::now();
        let start = Instant::now();
        let mut wait = self.cfg.first_wait;
        let mut buf = vec![0u8; self.cfg.read_buffer_size];
        let mut summary = RunSummary {
            channels: self.channels.len(),
            ..RunSummary::default()
        };

        while start.elapsed() < self.cfg.run_budget && running.load(Ordering::SeqCst) {
            if self.channels.iter().all(|c| !c.open) {
                debug!("all channels at end-of-stream, ending sweep early");
                break;
            }
            for idx in 0..self.channels.len() {
                if !self.channels[idx].open {
                    continue;
                }
                let waited = self.channels[idx].reader.wait_readable(wait);
                wait = self.cfg.sweep_wait;
                match waited {
                    Ok(Readiness::TimedOut) => continue,
                    Ok(Readiness::Ready) => {}
                    Err(err) => {
                        warn!(channel = idx, error = %err, "readiness wait failed");
                        summary.read_errors += 1;
                        continue;
                    }
                }
                match self.channels[idx].reader.read(&mut buf) {
                    // Zero bytes means the write end closed: nothing to
                    // forward, stop sweeping this channel.
                    Ok(0) => {
                        debug!(channel = idx, "end of stream");
                        self.channels[idx].open = false;
                    }
                    Ok(n) => {
                        self.forward(&epoch, &buf[..n], &mut summary)?;
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => {}
                    Err(err) => {
                        warn!(channel = idx, error = %err, "read failed");
                        summary.read_errors += 1;
                    }
                }
            }
        }

        // Shutdown: close every read end and flush the log.
        self.channels.clear();
        self.log.flush()?;
        debug!(
            messages = summary.messages_forwarded,
            bytes = summary.bytes_forwarded,
            "reader done"
        );
        Ok(summary)
    }

    fn forward(&mut self, epoch: &Epoch, raw: &[u8], summary: &mut RunSummary) -> Result<()> {
        let label = epoch.elapsed_label();
        let filtered = filter_message(raw);

        self.log.write_all(label.as_bytes())?;
        self.log.write_all(&filtered)?;

        // Console copy is best effort; a broken stdout must not end the run.
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(label.as_bytes());
        let _ = stdout.write_all(&filtered);

        summary.messages_forwarded += 1;
        summary.bytes_forwarded += filtered.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{run_generator, ProducerConfig};
    use pipemux_channel::create_channels;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn test_cfg(name: &str) -> Config {
        Config {
            run_budget: Duration::from_secs(3),
            max_sleep: Duration::ZERO,
            first_wait: Duration::from_millis(500),
            sweep_wait: Duration::from_millis(200),
            log_path: test_log_path(name),
            ..Config::default()
        }
    }

    fn test_log_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pipemux-reader-{name}-{}.txt", std::process::id()))
    }

    #[test]
    fn forwards_filtered_bytes_with_label_prefix() {
        let mut channels = create_channels(1).unwrap();
        let (pipe_reader, mut writer) = channels.remove(0).split();
        let readers = vec![pipe_reader];

        let cfg = test_cfg("forward");
        let mut reader = MuxReader::open(readers, &cfg).unwrap();

        writer.write_all(b"hello\n\0").unwrap();
        drop(writer);

        let running = AtomicBool::new(true);
        let summary = reader.run(&running).unwrap();

        assert_eq!(summary.channels, 1);
        assert!(summary.messages_forwarded >= 1);
        assert_eq!(summary.read_errors, 0);

        let log = std::fs::read_to_string(&cfg.log_path).unwrap();
        assert!(log.contains("hello\n"), "log: {log:?}");
        assert!(log.starts_with("0:0"), "label prefix missing: {log:?}");
        assert!(!log.contains('\0'), "NUL must be filtered out");
        let _ = std::fs::remove_file(&cfg.log_path);
    }

    #[test]
    fn ends_early_once_all_channels_close() {
        let channels = create_channels(2).unwrap();
        let (readers, writers): (Vec<_>, Vec<_>) =
            channels.into_iter().map(|c| c.split()).unzip();

        let mut cfg = test_cfg("early-exit");
        cfg.run_budget = Duration::from_secs(30);
        let mut reader = MuxReader::open(readers, &cfg).unwrap();
        drop(writers);

        let running = AtomicBool::new(true);
        let start = Instant::now();
        reader.run(&running).unwrap();
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "closed channels must end the run long before the budget"
        );
        let _ = std::fs::remove_file(&cfg.log_path);
    }

    #[test]
    fn cleared_running_flag_stops_the_sweep() {
        let mut channels = create_channels(1).unwrap();
        let (pipe_reader, _writer) = channels.remove(0).split();
        let readers = vec![pipe_reader];

        let mut cfg = test_cfg("flag-stop");
        cfg.run_budget = Duration::from_secs(30);
        let mut reader = MuxReader::open(readers, &cfg).unwrap();

        let running = AtomicBool::new(false);
        let start = Instant::now();
        let summary = reader.run(&running).unwrap();
        assert_eq!(summary.messages_forwarded, 0);
        assert!(start.elapsed() < Duration::from_secs(5));
        let _ = std::fs::remove_file(&cfg.log_path);
    }

    #[test]
    fn generator_to_reader_end_to_end() {
        let mut channels = create_channels(1).unwrap();
        let (pipe_reader, writer) = channels.remove(0).split();
        let readers = vec![pipe_reader];

        let cfg = test_cfg("e2e");
        let mut reader = MuxReader::open(readers, &cfg).unwrap();

        let producer_cfg = ProducerConfig {
            run_budget: Duration::from_secs(1),
            max_sleep: Duration::from_secs(1),
            seed: 0,
        };
        let producer = std::thread::spawn(move || run_generator(writer, 1, &producer_cfg));

        let running = AtomicBool::new(true);
        let start = Instant::now();
        let summary = reader.run(&running).unwrap();
        producer.join().unwrap().unwrap();

        assert!(
            start.elapsed() < cfg.run_budget + Duration::from_secs(3),
            "reader must not hang past budget plus slack"
        );
        assert!(summary.messages_forwarded >= 1);

        let log = std::fs::read_to_string(&cfg.log_path).unwrap();
        let line = log
            .lines()
            .find(|l| l.contains("Child 1 message"))
            .unwrap_or_else(|| panic!("no generator line in log: {log:?}"));
        // Shape: 0:0S.mmm: ... 0:0S.mmm: Child 1 message N
        assert!(line.starts_with("0:0"), "line: {line}");
        let (label, rest) = line.split_at(9);
        assert_eq!(&label[4..5], ".");
        assert_eq!(&label[8..9], ":");
        assert!(label[2..4].chars().all(|c| c.is_ascii_digit()));
        assert!(label[5..8].chars().all(|c| c.is_ascii_digit()));
        let n = rest
            .rsplit(' ')
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| panic!("no message number: {line}"));
        assert!(n >= 1);
        let _ = std::fs::remove_file(&cfg.log_path);
    }
}
