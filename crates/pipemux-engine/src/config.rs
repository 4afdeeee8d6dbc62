use std::path::PathBuf;
use std::time::Duration;

/// Default number of producer processes.
pub const DEFAULT_PRODUCERS: usize = 5;
/// Default total run duration.
pub const DEFAULT_RUN_BUDGET: Duration = Duration::from_secs(30);
/// Default maximum per-iteration generator sleep.
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_secs(2);
/// Readiness-wait timeout for the very first wait of a run.
pub const DEFAULT_FIRST_WAIT: Duration = Duration::from_secs(4);
/// Readiness-wait timeout for every subsequent wait.
pub const DEFAULT_SWEEP_WAIT: Duration = Duration::from_secs(2);
/// Per-read buffer size in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;
/// Default generator sleep-schedule seed.
pub const DEFAULT_SEED: u64 = 0;
/// Default log file path.
pub const DEFAULT_LOG_PATH: &str = "output.txt";

/// Run configuration shared by the supervisor, producers, and reader.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of producer processes to fork.
    pub producers: usize,
    /// Wall-clock duration after which every loop terminates.
    pub run_budget: Duration,
    /// Maximum generator sleep between messages (whole seconds).
    pub max_sleep: Duration,
    /// Readiness-wait timeout for the first wait of a run.
    pub first_wait: Duration,
    /// Readiness-wait timeout thereafter.
    pub sweep_wait: Duration,
    /// Bounded read size per pipe read.
    pub read_buffer_size: usize,
    /// Seed for the generators' deterministic sleep schedule.
    pub seed: u64,
    /// Log file the reader writes (created fresh, truncated).
    pub log_path: PathBuf,
    /// Whether the last producer relays stdin instead of generating.
    pub relay_stdin: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            producers: DEFAULT_PRODUCERS,
            run_budget: DEFAULT_RUN_BUDGET,
            max_sleep: DEFAULT_MAX_SLEEP,
            first_wait: DEFAULT_FIRST_WAIT,
            sweep_wait: DEFAULT_SWEEP_WAIT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            seed: DEFAULT_SEED,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            relay_stdin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.producers, 5);
        assert_eq!(cfg.run_budget, Duration::from_secs(30));
        assert_eq!(cfg.max_sleep, Duration::from_secs(2));
        assert_eq!(cfg.first_wait, Duration::from_secs(4));
        assert_eq!(cfg.sweep_wait, Duration::from_secs(2));
        assert_eq!(cfg.read_buffer_size, 1024);
        assert_eq!(cfg.seed, 0);
        assert!(cfg.relay_stdin);
    }
}
