use super::LogBuffer;
use crate::parser::LineUpdate;

/// Speed reported before the worker prints any.
pub const DEFAULT_SPEED: &str = "0";

/// Mutable metrics of the current worker instance.
///
/// Written by the output pump, read by `Supervisor::current_stats`. The
/// supervisor keeps it behind a single mutex; all fields change together.
#[derive(Debug, Clone)]
pub struct RuntimeStats {
    accepted: u64,
    speed: String,
    log: LogBuffer,
}

/// Owned copy of [`RuntimeStats`] at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Accepted shares since the current instance started.
    pub accepted: u64,
    /// Last speed reported by the worker (free-form, `"0"` until reported).
    pub speed: String,
    /// Bounded log text.
    pub log: String,
}

impl RuntimeStats {
    pub fn new(log_max_len: usize, log_prune_offset: usize) -> Self {
        Self {
            accepted: 0,
            speed: DEFAULT_SPEED.to_string(),
            log: LogBuffer::new(log_max_len, log_prune_offset),
        }
    }

    /// Back to zero shares, `"0"` speed and an empty log.
    pub fn reset(&mut self) {
        self.accepted = 0;
        self.speed = DEFAULT_SPEED.to_string();
        self.log.clear();
    }

    /// Records one output line and its classification.
    pub fn record(&mut self, line: &str, update: LineUpdate) {
        self.log.push_line(line);
        if update.accepted {
            self.accepted = self.accepted.saturating_add(1);
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn speed(&self) -> &str {
        &self.speed
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted,
            speed: self.speed.clone(),
            log: self.log.as_str().to_string(),
        }
    }
}

impl StatsSnapshot {
    /// True when nothing has been recorded since the last reset.
    pub fn is_pristine(&self) -> bool {
        self.accepted == 0 && self.speed == DEFAULT_SPEED && self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Grammar, classify};

    #[test]
    fn records_and_resets() {
        let mut stats = RuntimeStats::new(1024, 128);
        assert!(stats.snapshot().is_pristine());

        for line in [
            "[t] accepted (1/0) diff 100",
            "[2019-07-12 10:00:00] speed 10s/60s/15m 101.5 n/a n/a H/s",
            "[t] accepted (2/0) diff 100",
            "unrelated",
        ] {
            stats.record(line, classify(Grammar::Xmrig, line));
        }

        let snap = stats.snapshot();
        assert_eq!(snap.accepted, 2);
        assert_eq!(snap.speed, "101.5");
        assert_eq!(snap.log.lines().count(), 4);

        stats.reset();
        assert!(stats.snapshot().is_pristine());
    }
}
