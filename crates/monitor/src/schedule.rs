//! Business-hours schedule arithmetic.

use chrono::{DateTime, Days, Duration, LocalResult, TimeZone, Timelike};

/// Whether `now` falls inside the `[start_hour, end_hour)` window.
pub fn in_business_hours<Tz: TimeZone>(now: &DateTime<Tz>, start_hour: u32, end_hour: u32) -> bool {
    let hour = now.hour();
    start_hour <= hour && hour < end_hour
}

/// Compute the next check time:
/// - before the window → start of the window, same day;
/// - at/after the window end → start of the window, next day;
/// - inside the window → top of the next hour.
///
/// If the local time does not resolve cleanly (DST gap), falls back to one
/// hour from `now`.
pub fn next_wake<Tz: TimeZone>(now: &DateTime<Tz>, start_hour: u32, end_hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let fallback = now.clone() + Duration::hours(1);
    let today = now.date_naive();

    let naive = if now.hour() < start_hour {
        today.and_hms_opt(start_hour, 0, 0)
    } else if now.hour() >= end_hour {
        today
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(start_hour, 0, 0))
    } else {
        today
            .and_hms_opt(now.hour(), 0, 0)
            .map(|t| t + Duration::hours(1))
    };

    let Some(naive) = naive else {
        return fallback;
    };

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Kolkata;

    fn at(hour: u32, minute: u32) -> DateTime<chrono_tz::Tz> {
        Kolkata
            .with_ymd_and_hms(2025, 3, 10, hour, minute, 30)
            .unwrap()
    }

    #[test]
    fn test_before_window_waits_for_start() {
        let next = next_wake(&at(7, 0), 9, 18);
        assert_eq!(next, Kolkata.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_after_window_waits_for_next_day() {
        let next = next_wake(&at(19, 30), 9, 18);
        assert_eq!(next, Kolkata.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_inside_window_waits_for_next_hour() {
        let next = next_wake(&at(10, 15), 9, 18);
        assert_eq!(
            next,
            Kolkata.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_exactly_at_window_end_rolls_over() {
        let now = Kolkata.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        let next = next_wake(&now, 9, 18);
        assert_eq!(next, Kolkata.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_business_hours_bounds() {
        assert!(!in_business_hours(&at(8, 59), 9, 18));
        assert!(in_business_hours(&at(9, 0), 9, 18));
        assert!(in_business_hours(&at(17, 59), 9, 18));
        assert!(!in_business_hours(&at(18, 0), 9, 18));
    }
}
