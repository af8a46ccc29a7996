//! Forecast time series for a single EEZ.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a forecast time series.
///
/// Serialises as `{ "time": ..., "value": ... }`, the keys the chart
/// collaborator parses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    /// Density in m2/km2.
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// An ordered forecast series.
///
/// Always sorted ascending by time with unique timestamps. The series is
/// replaced wholesale on every successful fetch; there is no in-place editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastSeries(Vec<SeriesPoint>);

impl ForecastSeries {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a series, sorting by time and keeping the last value seen for
    /// any repeated timestamp.
    pub fn from_points(points: impl IntoIterator<Item = SeriesPoint>) -> Self {
        let mut points: Vec<SeriesPoint> = points.into_iter().collect();
        // Stable sort keeps payload order among equal timestamps.
        points.sort_by_key(|p| p.time);

        let mut unique: Vec<SeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match unique.last_mut() {
                Some(last) if last.time == point.time => *last = point,
                _ => unique.push(point),
            }
        }
        Self(unique)
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.0.last()
    }

    /// `(first, last)` timestamps, if any.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.first()?.time, self.last()?.time))
    }

    /// Points whose time lies within `[start, end]`, inclusive.
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ForecastSeries {
        Self(
            self.0
                .iter()
                .filter(|p| p.time >= start && p.time <= end)
                .copied()
                .collect(),
        )
    }

    /// Index of the point on the same UTC day as `time`.
    pub fn position_of_day(&self, time: &DateTime<Utc>) -> Option<usize> {
        self.0
            .iter()
            .position(|p| p.time.date_naive() == time.date_naive())
    }
}
