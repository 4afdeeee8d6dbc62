use std::time::{SystemTime, UNIX_EPOCH};

/// A process-local point-in-time reference for relative timestamp labels.
///
/// Each process (coordinator and every producer) captures its own epoch at
/// loop entry and threads it as a value into the formatter; epochs are never
/// synchronized across processes. Labels from different processes are only
/// approximately aligned, which is fine since all processes start together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    sec: i64,
    usec: i64,
}

impl Epoch {
    /// Capture the current wall-clock time.
    pub fn now() -> Self {
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            sec: since_unix.as_secs() as i64,
            usec: i64::from(since_unix.subsec_micros()),
        }
    }

    /// Build an epoch from explicit seconds and microseconds.
    pub fn from_parts(sec: i64, usec: i64) -> Self {
        Self { sec, usec }
    }

    /// Label for the time elapsed from `self` to now, as `"0:SS.mmm:"`.
    pub fn elapsed_label(&self) -> String {
        self.label_at(Epoch::now())
    }

    /// Label for the time elapsed from `self` to `now`, as `"0:SS.mmm:"`.
    ///
    /// The raw microsecond delta goes negative when `now` has crossed a
    /// second boundary; in that case one second's worth of microseconds is
    /// borrowed before dividing. The seconds field stays `now.sec - self.sec`
    /// either way, matching the observed output format.
    pub fn label_at(&self, now: Epoch) -> String {
        let mut millis = (now.usec - self.usec) / 1000;
        if millis < 0 {
            millis = ((now.usec + 1_000_000) - self.usec) / 1000;
        }
        let secs = now.sec - self.sec;
        format!("0:{secs:02}.{millis:03}:")
    }
}
