use std::sync::{Mutex, PoisonError};

/// Longest backoff, in seconds, regardless of the polling interval.
pub const LONGEST_BACKOFF_SECS: u64 = 300;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    skips: u64,
    failures: u64,
}

/// Backs off a periodic task after server errors.
///
/// Each failure makes the task skip more of its upcoming ticks, up to
/// `LONGEST_BACKOFF_SECS` worth of intervals. Auth and not-found errors
/// jump straight to the maximum.
#[derive(Debug)]
pub struct Throttler {
    interval_secs: u64,
    max_skips: u64,
    target: String,
    counters: Mutex<Counters>,
}

impl Throttler {
    pub fn new(interval_secs: u64, longest_backoff_secs: u64, target: impl Into<String>) -> Self {
        let max_skips = (longest_backoff_secs / interval_secs.max(1)).max(1);
        Self {
            interval_secs,
            max_skips,
            target: target.into(),
            counters: Mutex::new(Counters::default()),
        }
    }

    fn with_counters<T>(&self, f: impl FnOnce(&mut Counters) -> T) -> T {
        let mut guard = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Whether this tick should run.
    pub fn perform_action(&self) -> bool {
        self.with_counters(|c| c.skips == 0)
    }

    /// Record a tick that was skipped.
    pub fn skipped(&self) {
        self.with_counters(|c| c.skips = c.skips.saturating_sub(1));
    }

    pub fn decrement_failure_count_and_reset_skips(&self) {
        self.with_counters(|c| {
            if c.failures > 0 {
                c.failures -= 1;
                c.skips = c.failures;
            }
        });
    }

    pub fn handle_http_error_codes(&self, status: u16) {
        match status {
            401 | 403 => {
                self.maximize_skips();
                tracing::error!(
                    "Client was not authorized to talk to {}. Backing off to {} times our poll interval",
                    self.target,
                    self.max_skips
                );
            }
            404 => {
                self.maximize_skips();
                tracing::error!(
                    "Server said that {} does not exist. Backing off to {} times our poll interval",
                    self.target,
                    self.max_skips
                );
            }
            429 => {
                let (failures, skips) = self.increase_skip_count();
                tracing::info!(
                    "Rate limited for the {failures} time. Backing off to {skips} times our interval (of {} seconds)",
                    self.interval_secs
                );
            }
            s if s >= 500 => {
                let (_, skips) = self.increase_skip_count();
                tracing::info!(
                    "Server failed with a {s} status code. Backing off to {skips} times our interval (of {} seconds)",
                    self.interval_secs
                );
            }
            _ => {}
        }
    }

    fn maximize_skips(&self) {
        let max = self.max_skips;
        self.with_counters(|c| {
            c.skips = max;
            c.failures += 1;
        });
    }

    fn increase_skip_count(&self) -> (u64, u64) {
        let max = self.max_skips;
        self.with_counters(|c| {
            c.failures += 1;
            c.skips = c.failures.min(max);
            (c.failures, c.skips)
        })
    }

    pub fn skips(&self) -> u64 {
        self.with_counters(|c| c.skips)
    }

    pub fn failures(&self) -> u64 {
        self.with_counters(|c| c.failures)
    }

    pub fn max_skips(&self) -> u64 {
        self.max_skips
    }
}
