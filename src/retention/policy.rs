//! Immutable retention settings, built once at startup.

use std::time::Duration;

/// Maximum row age when none is configured.
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Cleanup cycle period when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Database size that triggers compaction when none is configured (1 GiB).
pub const DEFAULT_SIZE_LIMIT: u64 = 1024 * 1024 * 1024;

/// How long rows live, how often the sweep runs, and when to compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
    sweep_interval: Duration,
    size_limit: u64,
}

impl RetentionPolicy {
    /// Build a policy.
    ///
    /// A zero `window` falls back to the default; any other window is rounded
    /// up to whole seconds, the cutoff's resolution. The sweep interval is
    /// capped at the window so expired rows never outlive one extra window;
    /// a zero interval falls back to the default (also capped).
    pub fn new(window: Duration, sweep_interval: Duration, size_limit: u64) -> Self {
        let window = if window.is_zero() {
            DEFAULT_RETENTION_WINDOW
        } else {
            Duration::from_secs(window.as_secs() + u64::from(window.subsec_nanos() > 0))
        };
        let sweep_interval = if sweep_interval.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            sweep_interval
        }
        .min(window);

        Self {
            window,
            sweep_interval,
            size_limit,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// SQLite `datetime` modifier selecting the retention cutoff, e.g.
    /// `-86400 seconds`. Bound as a parameter, never interpolated.
    pub fn cutoff_modifier(&self) -> String {
        format!("-{} seconds", self.window.as_secs())
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETENTION_WINDOW,
            DEFAULT_SWEEP_INTERVAL,
            DEFAULT_SIZE_LIMIT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.window(), Duration::from_secs(86_400));
        assert_eq!(policy.sweep_interval(), Duration::from_secs(300));
        assert_eq!(policy.size_limit(), 1 << 30);
        assert_eq!(policy.cutoff_modifier(), "-86400 seconds");
    }

    #[test]
    fn test_sweep_interval_capped_at_window() {
        let policy = RetentionPolicy::new(Duration::from_secs(60), Duration::from_secs(600), 10);
        assert_eq!(policy.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_values_fall_back() {
        let policy = RetentionPolicy::new(Duration::ZERO, Duration::ZERO, 10);
        assert_eq!(policy.window(), DEFAULT_RETENTION_WINDOW);
        assert_eq!(policy.sweep_interval(), DEFAULT_SWEEP_INTERVAL);

        let short = RetentionPolicy::new(Duration::from_secs(30), Duration::ZERO, 10);
        assert_eq!(short.sweep_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_sub_second_window_rounds_up() {
        let policy = RetentionPolicy::new(Duration::from_millis(500), Duration::ZERO, 10);
        assert_eq!(policy.window(), Duration::from_secs(1));
        assert_eq!(policy.cutoff_modifier(), "-1 seconds");
        assert_eq!(policy.sweep_interval(), Duration::from_secs(1));

        let fractional = RetentionPolicy::new(Duration::from_millis(90_250), Duration::ZERO, 10);
        assert_eq!(fractional.cutoff_modifier(), "-91 seconds");
    }
}
