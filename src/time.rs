//! CF time-axis decoding and timestamp helpers.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use regex::Regex;

use crate::error::DatasetError;

static UNITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<unit>[A-Za-z]+)\s+since\s+(?P<base>.+?)\s*$").expect("valid regex")
});

/// Seconds per unit for the CF time units we accept.
fn unit_seconds(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0),
        "minutes" | "minute" | "mins" | "min" => Some(60.0),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(3600.0),
        "days" | "day" | "d" => Some(86_400.0),
        _ => None,
    }
}

/// Parse the reference date of a CF units string.
///
/// Accepts date-only, `date time` and `dateTtime` forms, optionally followed
/// by a `Z` or numeric UTC offset. A missing offset means UTC.
pub fn parse_reference_time(base: &str) -> Option<DateTime<Utc>> {
    let base = base.trim();

    const WITH_OFFSET: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%d %H:%M:%S%.f %z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(base, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = base.trim_end_matches('Z').trim_end_matches(" UTC").trim();
    const NAIVE: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in NAIVE {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Decode numeric CF offsets (`"<unit> since <reference>"`) into UTC timestamps.
pub fn decode_cf_times(values: &[f64], units: &str) -> Result<Vec<DateTime<Utc>>, DatasetError> {
    let caps = UNITS_RE.captures(units).ok_or_else(|| DatasetError::InvalidTime {
        reason: format!("unexpected time units format: '{units}'"),
    })?;
    let scale = unit_seconds(&caps["unit"]).ok_or_else(|| DatasetError::InvalidTime {
        reason: format!("unsupported time unit '{}'", &caps["unit"]),
    })?;
    let reference = parse_reference_time(&caps["base"]).ok_or_else(|| DatasetError::InvalidTime {
        reason: format!("failed to parse reference time '{}'", &caps["base"]),
    })?;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return Err(DatasetError::InvalidTime {
                    reason: format!("non-finite time value {v}"),
                });
            }
            let micros = (v * scale * 1e6).round() as i64;
            reference
                .checked_add_signed(TimeDelta::microseconds(micros))
                .ok_or_else(|| DatasetError::InvalidTime {
                    reason: format!("time value {v} out of range"),
                })
        })
        .collect()
}

/// Round a timestamp to the nearest whole second, exact halves to the even second.
pub fn round_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = t.nanosecond() % 1_000_000_000;
    let floored = t - TimeDelta::nanoseconds(nanos as i64);
    let round_up = match nanos.cmp(&500_000_000) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => floored.timestamp().rem_euclid(2) == 1,
    };
    if round_up {
        floored + TimeDelta::seconds(1)
    } else {
        floored
    }
}

/// Seconds between two timestamps, with sub-second precision.
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let delta = b - a;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_seconds() as f64,
    }
}

/// Text form used by formats that cannot hold native timestamps.
pub fn format_plain(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// ISO 8601 form used by JSON and XML outputs.
pub fn format_iso(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
