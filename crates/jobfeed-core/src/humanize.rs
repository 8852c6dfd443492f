use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Render `date` relative to `now`, e.g. "3 days ago" or "2 hours from now".
///
/// Uses the largest whole unit; anything under a second reads as one second.
pub fn ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(date).num_seconds();
    let seconds = delta.abs();

    let (count, unit) = if seconds < MINUTE {
        (seconds.max(1), "second")
    } else if seconds < HOUR {
        (seconds / MINUTE, "minute")
    } else if seconds < DAY {
        (seconds / HOUR, "hour")
    } else if seconds < WEEK {
        (seconds / DAY, "day")
    } else if seconds < MONTH {
        (seconds / WEEK, "week")
    } else if seconds < YEAR {
        (seconds / MONTH, "month")
    } else {
        (seconds / YEAR, "year")
    };

    let plural = if count == 1 { "" } else { "s" };
    let direction = if delta < 0 { "from now" } else { "ago" };
    format!("{count} {unit}{plural} {direction}")
}
