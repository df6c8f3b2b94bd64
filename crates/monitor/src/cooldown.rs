//! Alert cooldown — rate-limits disconnect alerts.
//!
//! State lives in memory for the lifetime of the monitor process. A restart
//! resets the window, which is acceptable: false alerts are capped by the
//! interval, not eliminated across restarts.

use chrono::{DateTime, Duration, Utc};

/// In-memory cooldown gate.
#[derive(Debug)]
pub struct AlertCooldown {
    last_alert_at: Option<DateTime<Utc>>,
    min_interval: Duration,
}

impl AlertCooldown {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_alert_at: None,
            min_interval,
        }
    }

    /// Whether enough time has passed since the last dispatched alert.
    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        match self.last_alert_at {
            None => true,
            Some(last) => now - last >= self.min_interval,
        }
    }

    /// Record a successfully dispatched alert. Only called after the
    /// transport confirmed delivery, so a failed send does not burn the
    /// window.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_alert_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_alert_passes() {
        let cooldown = AlertCooldown::new(Duration::seconds(3600));
        assert!(cooldown.ready(Utc::now()));
    }

    #[test]
    fn test_ten_attempts_in_a_minute_dispatch_once() {
        let mut cooldown = AlertCooldown::new(Duration::seconds(3600));
        let start = Utc::now();

        let mut dispatched = 0;
        for i in 0..10 {
            let now = start + Duration::seconds(i * 6);
            if cooldown.ready(now) {
                cooldown.record(now);
                dispatched += 1;
            }
        }

        assert_eq!(dispatched, 1);
    }

    #[test]
    fn test_window_reopens_after_interval() {
        let mut cooldown = AlertCooldown::new(Duration::seconds(3600));
        let start = Utc::now();

        assert!(cooldown.ready(start));
        cooldown.record(start);
        assert!(!cooldown.ready(start + Duration::seconds(3599)));
        assert!(cooldown.ready(start + Duration::seconds(3600)));
    }

    #[test]
    fn test_failed_dispatch_does_not_burn_window() {
        let cooldown = AlertCooldown::new(Duration::seconds(3600));
        let start = Utc::now();

        // ready() alone must not consume the window
        assert!(cooldown.ready(start));
        assert!(cooldown.ready(start + Duration::seconds(1)));
    }
}
