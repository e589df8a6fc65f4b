//! Timestamp handling for reading `ts` strings.
//!
//! The producer stamps readings with local wall-clock time but appends a `Z`.
//! The suffix is stripped and the rest is read as local time; treating it as
//! UTC would shift every chart by the station's UTC offset.

use chrono::{DateTime, Local, NaiveDateTime};

use crate::metrics::NO_DATA;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses `ts` as local wall-clock time. One trailing `Z` is dropped first;
/// strings carrying an explicit offset are converted into local time.
pub fn parse_ts_local(ts: &str) -> Option<NaiveDateTime> {
    let ts = ts.trim();
    let s = ts.strip_suffix('Z').unwrap_or(ts);

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `2025-06-01 14:03:00`, the raw string if it does not parse, `—` if absent.
pub fn format_local(ts: Option<&str>) -> String {
    match ts {
        None | Some("") => NO_DATA.to_owned(),
        Some(raw) => parse_ts_local(raw)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| raw.to_owned()),
    }
}

/// Relative age such as `42s ago`, `5m ago` or `3h ago`.
pub fn format_ago(ts: Option<&str>, now: NaiveDateTime) -> String {
    let Some(then) = ts.and_then(parse_ts_local) else {
        return NO_DATA.to_owned();
    };
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    format!("{}h ago", mins / 60)
}
