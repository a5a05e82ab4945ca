//! Resolution of relative time windows for the time-series endpoints.
//!
//! A window is either two absolute timestamps, passed through untouched, or a
//! negative minute offset paired with the literal `"now"`. The relative form is
//! resolved against the caller's timezone and rendered as a naive wall-clock
//! string, since that is what the API expects.

use chrono::{DateTime, SubsecRound, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt::Display;
use tracing::debug;

use crate::error::UsageError;

/// End bound that triggers relative resolution.
pub const NOW: &str = "now";

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an IANA timezone name such as `Europe/Paris`.
pub fn parse_timezone(name: &str) -> Result<Tz, UsageError> {
    name.parse::<Tz>().map_err(|_| UsageError::UnknownTimezone {
        name: name.to_string(),
    })
}

/// Parse the minute offset of a relative window. Only negative integers are accepted.
pub fn parse_relative_start(start: &str) -> Result<i64, UsageError> {
    match start.trim().parse::<i64>() {
        Ok(m) if m < 0 => Ok(m),
        _ => Err(UsageError::InvalidRelativeStart {
            value: start.to_string(),
        }),
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SS`, no offset suffix.
pub fn format_time<Z>(dt: &DateTime<Z>) -> String
where
    Z: TimeZone,
    Z::Offset: Display,
{
    dt.format(WIRE_FORMAT).to_string()
}

/// Resolve `(start, end)` into the strings sent as `startTime`/`endTime`.
///
/// - Either bound missing: both are returned as given.
/// - `end == "now"`: `start` must be a negative number of minutes; both bounds
///   are computed from `now` in `tz`, truncated to whole seconds.
/// - Any other `end`: both are returned as given, unvalidated.
pub fn resolve(
    start: Option<&str>,
    end: Option<&str>,
    tz: &str,
    now: DateTime<Utc>,
) -> Result<(Option<String>, Option<String>), UsageError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok((start.map(String::from), end.map(String::from)));
    };
    if end != NOW {
        return Ok((Some(start.to_string()), Some(end.to_string())));
    }

    let minutes = parse_relative_start(start)?;
    let zone = parse_timezone(tz)?;

    let end_time = now.with_timezone(&zone).trunc_subsecs(0);
    let start_time = TimeDelta::try_minutes(minutes)
        .and_then(|d| end_time.checked_add_signed(d))
        .ok_or_else(|| UsageError::InvalidRelativeStart {
            value: start.to_string(),
        })?;

    let (start_s, end_s) = (format_time(&start_time), format_time(&end_time));
    debug!(start_time = %start_s, end_time = %end_s, tz, "Resolved relative time range");
    Ok((Some(start_s), Some(end_s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::testing::ManualClock;

    fn now() -> DateTime<Utc> {
        ManualClock::fixed().now()
    }

    #[test]
    fn test_relative_window_in_utc() {
        let (start, end) = resolve(Some("-30"), Some("now"), "UTC", now()).unwrap();
        assert_eq!(start.as_deref(), Some("2024-03-10T11:30:00"));
        assert_eq!(end.as_deref(), Some("2024-03-10T12:00:00"));
    }

    #[test]
    fn test_relative_window_uses_local_wall_clock() {
        let (start, end) = resolve(Some("-60"), Some("now"), "Europe/Paris", now()).unwrap();
        assert_eq!(start.as_deref(), Some("2024-03-10T12:00:00"));
        assert_eq!(end.as_deref(), Some("2024-03-10T13:00:00"));
    }

    #[test]
    fn test_relative_window_across_dst_change() {
        // New York springs forward at 07:00 UTC that day.
        let (start, end) = resolve(Some("-360"), Some("now"), "America/New_York", now()).unwrap();
        assert_eq!(start.as_deref(), Some("2024-03-10T01:00:00"));
        assert_eq!(end.as_deref(), Some("2024-03-10T08:00:00"));
    }

    #[test]
    fn test_non_negative_start_is_rejected() {
        for bad in ["5", "0", "-0", "abc", "-1.5", ""] {
            let err = resolve(Some(bad), Some("now"), "UTC", now()).unwrap_err();
            assert_eq!(
                err,
                UsageError::InvalidRelativeStart {
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let err = resolve(Some("-5"), Some("now"), "Mars/Olympus_Mons", now()).unwrap_err();
        assert_eq!(
            err,
            UsageError::UnknownTimezone {
                name: "Mars/Olympus_Mons".to_string()
            }
        );
        assert!(err.to_string().contains("tz database format"));
    }

    #[test]
    fn test_missing_bound_passes_through() {
        assert_eq!(resolve(None, None, "UTC", now()).unwrap(), (None, None));
        assert_eq!(
            resolve(Some("-5"), None, "nowhere", now()).unwrap(),
            (Some("-5".to_string()), None)
        );
    }

    #[test]
    fn test_absolute_bounds_pass_through_unvalidated() {
        let (start, end) = resolve(
            Some("2024-01-01T00:00:00"),
            Some("2024-01-02T00:00:00"),
            "not/a/zone",
            now(),
        )
        .unwrap();
        assert_eq!(start.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(end.as_deref(), Some("2024-01-02T00:00:00"));
    }

    #[test]
    fn test_overflowing_offset_is_rejected() {
        let huge = i64::MIN.to_string();
        assert!(resolve(Some(&huge), Some("now"), "UTC", now()).is_err());
    }
}
