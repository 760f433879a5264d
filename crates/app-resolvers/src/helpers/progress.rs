//! Progress parsing and notification throttling.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("invalid percent regex"));

/// Pull a percentage out of a line of downloader output.
///
/// Works for `megatools' ("42.0% of 10MB (3.5MB/s)"), yt-dlp progress
/// templates ("  42.0%") and aria2c summaries. Lines without a
/// recognizable percentage yield `None`, never an error.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_percent_line(line: &str) -> Option<u8> {
    let captures = PERCENT.captures(line)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;

    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Some(value.floor() as u8)
    } else {
        None
    }
}

/// Percentage of a transfer, from observed vs. expected byte counts.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn transfer_percent(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }

    (current.saturating_mul(100) / total).min(100) as u8
}

/// Decides which percentage updates are worth a chat-message edit.
///
/// Policy: notify on the first report, on completion, and otherwise
/// only when the percentage moved by at least `min_delta` AND at least
/// `min_interval` passed since the previous notification.
#[derive(Debug)]
pub struct ProgressThrottle {
    min_delta: u8,
    min_interval: Duration,
    last_percent: Option<u8>,
    last_notified_at: Option<Instant>,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(2))
    }
}

impl ProgressThrottle {
    #[must_use]
    pub const fn new(min_delta: u8, min_interval: Duration) -> Self {
        Self {
            min_delta,
            min_interval,
            last_percent: None,
            last_notified_at: None,
        }
    }

    pub fn should_notify(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);

        let notify = match (self.last_percent, self.last_notified_at) {
            (None, _) | (_, None) => true,
            (Some(last), Some(at)) => {
                (percent == 100 && last < 100)
                    || (percent >= last.saturating_add(self.min_delta)
                        && at.elapsed() >= self.min_interval)
            }
        };

        if notify {
            self.last_percent = Some(percent);
            self.last_notified_at = Some(Instant::now());
        }

        notify
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_megatools_style_lines() {
        assert_eq!(parse_percent_line("42.0% of 10MB (3.5MB/s)"), Some(42));
        assert_eq!(parse_percent_line("99.9% of 1.2GB (12.1MB/s)"), Some(99));
    }

    #[test]
    fn parses_bare_percentages() {
        assert_eq!(parse_percent_line("  42.0%"), Some(42));
        assert_eq!(parse_percent_line("100%"), Some(100));
    }

    #[test]
    fn malformed_lines_yield_nothing() {
        assert_eq!(parse_percent_line(""), None);
        assert_eq!(parse_percent_line("downloading..."), None);
        assert_eq!(parse_percent_line("% of nothing"), None);
        assert_eq!(parse_percent_line("1e99999% nope"), None);
    }

    #[test]
    fn transfer_percent_is_clamped() {
        assert_eq!(transfer_percent(0, 100), 0);
        assert_eq!(transfer_percent(50, 100), 50);
        assert_eq!(transfer_percent(150, 100), 100);
        assert_eq!(transfer_percent(10, 0), 0);
    }

    #[test]
    fn two_milestones_yield_two_notifications() {
        let mut throttle = ProgressThrottle::new(10, Duration::ZERO);

        let notified = [50, 100]
            .into_iter()
            .filter(|p| throttle.should_notify(*p))
            .count();

        assert_eq!(notified, 2);
    }

    #[test]
    fn completion_bypasses_the_interval() {
        let mut throttle = ProgressThrottle::new(10, Duration::from_secs(3600));

        assert!(throttle.should_notify(50));
        assert!(!throttle.should_notify(60));
        assert!(throttle.should_notify(100));
    }

    #[test]
    fn small_deltas_are_suppressed() {
        let mut throttle = ProgressThrottle::new(10, Duration::ZERO);

        assert!(throttle.should_notify(10));
        assert!(!throttle.should_notify(15));
        assert!(!throttle.should_notify(19));
        assert!(throttle.should_notify(20));
    }

    #[test]
    fn repeated_completion_is_reported_once() {
        let mut throttle = ProgressThrottle::new(10, Duration::ZERO);

        assert!(throttle.should_notify(100));
        assert!(!throttle.should_notify(100));
    }
}
