//! Client-side preparation of a history series before it is drawn.

use chrono::{Duration, NaiveDateTime};

use crate::{metrics::finite, ranges::RangePreset, source::Reading};

/// Points newer than `now` are still kept within this tolerance.
const FUTURE_SLACK_SECS: i64 = 60;

const DAY_MS: u64 = 24 * 60 * 60_000;

/// Upper bound on drawn points for a range width.
pub fn max_points(duration_ms: u64) -> usize {
    if duration_ms >= 7 * DAY_MS {
        650
    } else if duration_ms >= DAY_MS {
        900
    } else {
        1200
    }
}

/// Crops `series` to the preset's window ending at `now`, then thins it out
/// to at most [`max_points`] points. Readings with an unparseable timestamp
/// are dropped.
pub fn prepare<'a>(series: &'a [Reading], preset: &RangePreset, now: NaiveDateTime) -> Vec<&'a Reading> {
    let from = now - Duration::milliseconds(preset.duration_ms as i64);
    let until = now + Duration::seconds(FUTURE_SLACK_SECS);

    let cropped: Vec<&Reading> = series
        .iter()
        .filter(|r| r.timestamp().is_some_and(|t| t >= from && t <= until))
        .collect();

    downsample(cropped, max_points(preset.duration_ms))
}

/// Keeps every `ceil(len / max)`-th element, starting with the first.
pub fn downsample<T>(items: Vec<T>, max: usize) -> Vec<T> {
    if max == 0 || items.len() <= max {
        return items;
    }
    let step = items.len().div_ceil(max);
    items.into_iter().step_by(step).collect()
}

/// Lowest and highest finite value, `None` when there is none.
pub fn min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .filter_map(finite)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
