//! Time slot arithmetic shared by acquisition, fusion and the read API
//!
//! Every product is published on a fixed cadence counted from midnight UTC, so
//! a slot is valid exactly when it is a whole multiple of its cadence since the
//! epoch.

use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};

/// Spacing of radar sweeps, rain forecasts and danger ticks
pub const FIVE_MINUTES: TimeDelta = TimeDelta::minutes(5);

/// Spacing of wind forecasts
pub const ONE_HOUR: TimeDelta = TimeDelta::hours(1);

/// Round `ts` down to the previous multiple of `step`
pub fn floor(ts: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let step_ms = step.num_milliseconds();
    if step_ms <= 0 {
        return ts;
    }
    ts - TimeDelta::milliseconds(ts.timestamp_millis().rem_euclid(step_ms))
}

pub fn is_aligned(ts: DateTime<Utc>, step: TimeDelta) -> bool {
    floor(ts, step) == ts
}

/// Midnight UTC at the start of the day before `now`
pub fn previous_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let day = now.date_naive() - Days::new(1);
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Slots `start, start + step, ...` strictly before `end`
pub fn ticks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
) -> impl Iterator<Item = DateTime<Utc>> {
    let mut next = start;
    std::iter::from_fn(move || {
        if next >= end || step <= TimeDelta::zero() {
            return None;
        }
        let current = next;
        next += step;
        Some(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_floor_to_five_minutes() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 7, 42).unwrap();
        assert_eq!(
            floor(ts, FIVE_MINUTES),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap()
        );
        assert_eq!(
            floor(ts, ONE_HOUR),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_aligned() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap();
        assert!(is_aligned(ts, FIVE_MINUTES));
        assert!(!is_aligned(ts, ONE_HOUR));
    }

    #[test]
    fn test_previous_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(
            previous_midnight(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_ticks_exclude_end() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let all: Vec<_> = ticks(start, start + ONE_HOUR, FIVE_MINUTES).collect();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0], start);
        assert_eq!(all[11], start + TimeDelta::minutes(55));
        assert_eq!(ticks(start, start, FIVE_MINUTES).count(), 0);
    }
}
