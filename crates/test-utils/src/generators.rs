//! Generators for synthetic forecast series and point samples.
//!
//! All series are daily at 12:00 UTC, matching the forecast API.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use sargassum_common::time::ANCHOR_HOUR;
use sargassum_common::{SamplePoint, SeriesPoint};

/// Noon UTC on an ISO date. Panics on a malformed date; test input only.
pub fn noon(date: &str) -> DateTime<Utc> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid test date");
    Utc.from_utc_datetime(&day.and_hms_opt(ANCHOR_HOUR, 0, 0).expect("valid anchor hour"))
}

/// One point per day starting at `start`, taking values in order.
pub fn daily_series(start: &str, values: &[f64]) -> Vec<SeriesPoint> {
    let t0 = noon(start);
    values
        .iter()
        .enumerate()
        .map(|(i, v)| SeriesPoint::new(t0 + Duration::days(i as i64), *v))
        .collect()
}

/// Linear ramp from `from` to `to` over `days` points.
pub fn ramp_series(start: &str, days: usize, from: f64, to: f64) -> Vec<SeriesPoint> {
    let step = if days > 1 {
        (to - from) / (days - 1) as f64
    } else {
        0.0
    };
    let values: Vec<f64> = (0..days).map(|i| from + step * i as f64).collect();
    daily_series(start, &values)
}

/// Low, then a plateau of `high` between `rise` and `fall` (exclusive), then low.
pub fn plateau_series(
    start: &str,
    days: usize,
    rise: usize,
    fall: usize,
    low: f64,
    high: f64,
) -> Vec<SeriesPoint> {
    let values: Vec<f64> = (0..days)
        .map(|i| if i >= rise && i < fall { high } else { low })
        .collect();
    daily_series(start, &values)
}

/// A regular lattice of samples at 0.25° spacing with a predictable value
/// per cell: `(col + row) * 0.001`.
pub fn sample_lattice(
    min_lon: f64,
    min_lat: f64,
    cols: usize,
    rows: usize,
    time: DateTime<Utc>,
) -> Vec<SamplePoint> {
    let mut samples = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            samples.push(SamplePoint::new(
                min_lon + col as f64 * 0.25,
                min_lat + row as f64 * 0.25,
                time,
                (col + row) as f64 * 0.001,
            ));
        }
    }
    samples
}
