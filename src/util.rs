use crate::error::{GhoursError, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601-like timestamp, normalizing to UTC.
///
/// Values without an offset are taken to already be UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(input, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a `--since`/`--until` bound: RFC3339, YYYY-MM-DD, or "N days ago".
pub fn parse_date_bound(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Some(dt) = parse_timestamp(input) {
        return Ok(dt);
    }

    if let Some(ago) = parse_natural_duration(input) {
        return now
            .checked_sub_signed(ago)
            .ok_or_else(|| GhoursError::InvalidDate(format!("Duration overflow for '{input}'")));
    }

    Err(GhoursError::InvalidDate(format!(
        "'{input}' is not RFC3339, YYYY-MM-DD, or 'N days/weeks/months ago'"
    )))
}

fn parse_natural_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    let rest = input.strip_suffix(" ago")?;
    let (count, unit) = rest.trim().split_once(' ')?;
    let n: i64 = count.trim().parse().ok()?;

    let days = match unit.trim() {
        "day" | "days" => n,
        "week" | "weeks" => n.checked_mul(7)?,
        "month" | "months" => n.checked_mul(30)?,
        _ => return None,
    };
    Duration::try_days(days)
}

/// Parse a humantime duration such as `3h`, `90m` or `1h 30m`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let parsed = humantime::parse_duration(input.trim())
        .map_err(|e| GhoursError::InvalidDuration(format!("'{input}': {e}")))?;
    Duration::from_std(parsed).map_err(|e| GhoursError::InvalidDuration(format!("'{input}': {e}")))
}

/// Render a duration as `<hours>h <minutes>m`, truncating to whole minutes.
pub fn format_hm(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}
