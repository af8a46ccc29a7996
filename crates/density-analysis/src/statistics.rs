//! Peak and threshold-crossing statistics over a forecast series.
//!
//! A single pass tracks the running maximum and a small open/closed state
//! machine for runs at or above the threshold:
//!
//! ```text
//!   closed --(value >= threshold)--> open(start)
//!   open   --(later value <= threshold)--> closed, emit (start, end)
//!   open at end of scan --> emit (start, None)
//! ```
//!
//! The scan excludes the final point of the series unless
//! [`ScanBoundary::IncludeLast`] is selected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use sargassum_common::SeriesPoint;

/// Square metres covered by one soccer field, per km2 of density.
pub const SOCCER_FIELD_M2: f64 = 7000.0;

/// Tons of biomass per 1000 m2 of sargassum cover.
pub const TONS_PER_1000_M2: f64 = 3.34;

/// Which points of the series the scan visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanBoundary {
    /// Indices `0..n-1`: the last point is never scanned. Matches the
    /// long-standing viewer output.
    #[default]
    ExcludeLast,
    /// Every point is scanned.
    IncludeLast,
}

impl ScanBoundary {
    fn scanned<'a>(&self, series: &'a [SeriesPoint]) -> &'a [SeriesPoint] {
        match self {
            ScanBoundary::ExcludeLast => &series[..series.len().saturating_sub(1)],
            ScanBoundary::IncludeLast => series,
        }
    }
}

/// A maximal run of points at or above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub start: SeriesPoint,
    /// First later point back at or below the threshold; `None` while the run
    /// is still open at the end of the scanned data.
    pub end: Option<SeriesPoint>,
}

impl Intersection {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end.map(|p| p.time)
    }
}

/// Peak density expressed as everyday equivalents over an EEZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualMeasure {
    /// Soccer fields of sargassum cover.
    pub field_count: i64,
    /// Metric tons of biomass.
    pub tone_weight: i64,
}

/// Visual measure for a peak density (m2/km2) over `area_km2`.
pub fn visual_measure(peak_value: f64, area_km2: f64) -> VisualMeasure {
    let covered_m2 = peak_value * area_km2;
    VisualMeasure {
        field_count: (covered_m2 / SOCCER_FIELD_M2).floor() as i64,
        tone_weight: (TONS_PER_1000_M2 * covered_m2 / 1000.0).floor() as i64,
    }
}

/// Output of a statistics pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesStatistics {
    /// Highest scanned point; earliest wins on ties.
    pub peak: Option<SeriesPoint>,
    /// Threshold runs in chronological order.
    pub intersections: Vec<Intersection>,
    /// Present whenever `peak` is.
    pub visual_measure: Option<VisualMeasure>,
}

impl SeriesStatistics {
    /// Nothing was scanned; the display falls back to placeholders.
    pub fn is_empty(&self) -> bool {
        self.peak.is_none()
    }
}

/// Statistics over a series with a fixed scan boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsEngine {
    boundary: ScanBoundary,
}

impl StatisticsEngine {
    pub fn new(boundary: ScanBoundary) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> ScanBoundary {
        self.boundary
    }

    /// Compute peak, threshold runs and visual measure.
    ///
    /// `series` must be sorted by time; [`sargassum_common::ForecastSeries`]
    /// guarantees that.
    pub fn compute(
        &self,
        series: &[SeriesPoint],
        threshold: f64,
        area_km2: f64,
    ) -> SeriesStatistics {
        let scanned = self.boundary.scanned(series);

        let mut peak: Option<SeriesPoint> = None;
        let mut intersections = Vec::new();
        let mut open: Option<SeriesPoint> = None;

        for point in scanned {
            if peak.map_or(true, |p| point.value > p.value) {
                peak = Some(*point);
            }

            match open {
                None if point.value >= threshold => open = Some(*point),
                Some(start) if point.value <= threshold => {
                    intersections.push(Intersection {
                        start,
                        end: Some(*point),
                    });
                    open = None;
                }
                _ => {}
            }
        }

        if let Some(start) = open {
            intersections.push(Intersection { start, end: None });
        }

        trace!(
            scanned = scanned.len(),
            runs = intersections.len(),
            boundary = ?self.boundary,
            "Computed series statistics"
        );

        SeriesStatistics {
            visual_measure: peak.map(|p| visual_measure(p.value, area_km2)),
            peak,
            intersections,
        }
    }
}

/// Statistics with the default scan boundary.
pub fn compute_statistics(
    series: &[SeriesPoint],
    threshold: f64,
    area_km2: f64,
) -> SeriesStatistics {
    StatisticsEngine::default().compute(series, threshold, area_km2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let t0 = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(t0 + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_run_closes_on_final_point_when_included() {
        let s = series(&[50.0, 90.0, 95.0, 60.0]);
        let stats = StatisticsEngine::new(ScanBoundary::IncludeLast).compute(&s, 80.0, 1000.0);

        assert_eq!(stats.peak, Some(s[2]));
        assert_eq!(
            stats.intersections,
            vec![Intersection {
                start: s[1],
                end: Some(s[3]),
            }]
        );
    }

    #[test]
    fn test_run_left_open_when_final_point_excluded() {
        let s = series(&[50.0, 90.0, 95.0, 60.0]);
        let stats = compute_statistics(&s, 80.0, 1000.0);

        assert_eq!(stats.peak, Some(s[2]));
        assert_eq!(stats.intersections.len(), 1);
        assert_eq!(stats.intersections[0].start, s[1]);
        assert!(stats.intersections[0].is_open());
    }

    #[test]
    fn test_final_point_never_scanned_by_default() {
        let s = series(&[10.0, 20.0, 500.0]);
        let stats = compute_statistics(&s, 100.0, 1.0);
        assert_eq!(stats.peak, Some(s[1]));
        assert!(stats.intersections.is_empty());
    }

    #[test]
    fn test_single_point_and_empty() {
        let one = series(&[120.0]);
        let stats = compute_statistics(&one, 80.0, 1.0);
        assert!(stats.is_empty());
        assert!(stats.intersections.is_empty());
        assert!(stats.visual_measure.is_none());

        assert!(compute_statistics(&[], 80.0, 1.0).is_empty());

        let included = StatisticsEngine::new(ScanBoundary::IncludeLast).compute(&one, 80.0, 1.0);
        assert_eq!(included.peak, Some(one[0]));
        assert!(included.intersections[0].is_open());
    }

    #[test]
    fn test_multiple_runs_in_order() {
        let s = series(&[90.0, 10.0, 85.0, 88.0, 20.0, 95.0, 99.0, 0.0]);
        let stats = StatisticsEngine::new(ScanBoundary::IncludeLast).compute(&s, 80.0, 1.0);

        let spans: Vec<_> = stats
            .intersections
            .iter()
            .map(|i| (i.start_time(), i.end_time()))
            .collect();
        assert_eq!(
            spans,
            vec![
                (s[0].time, Some(s[1].time)),
                (s[2].time, Some(s[4].time)),
                (s[5].time, Some(s[7].time)),
            ]
        );
    }

    #[test]
    fn test_value_equal_to_threshold() {
        // Opening on an exact hit does not close on the same point; a later
        // exact hit closes the run.
        let s = series(&[80.0, 90.0, 80.0, 10.0]);
        let stats = StatisticsEngine::new(ScanBoundary::IncludeLast).compute(&s, 80.0, 1.0);
        assert_eq!(
            stats.intersections,
            vec![Intersection {
                start: s[0],
                end: Some(s[2]),
            }]
        );
        for run in &stats.intersections {
            if let Some(end) = run.end {
                assert!(run.start.time < end.time);
            }
        }
    }

    #[test]
    fn test_peak_ties_keep_earliest() {
        let s = series(&[5.0, 7.0, 7.0, 1.0]);
        let stats = compute_statistics(&s, 100.0, 1.0);
        assert_eq!(stats.peak, Some(s[1]));
    }

    #[test]
    fn test_visual_measure() {
        // 120 m2/km2 over 95 978 km2 = 11 517 360 m2
        let m = visual_measure(120.0, 95_978.0);
        assert_eq!(m.field_count, 1645);
        assert_eq!(m.tone_weight, 38467);

        assert_eq!(
            visual_measure(0.0, 95_978.0),
            VisualMeasure {
                field_count: 0,
                tone_weight: 0
            }
        );
    }
}
