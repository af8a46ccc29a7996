//! Per-segment styling of the forecast chart line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sargassum_common::time::same_day;
use sargassum_common::SeriesPoint;

use crate::ramp::Color;

/// How a chart segment ending at a given point is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStyle {
    /// Segment ends on the currently selected date.
    Selected,
    /// Strictly above the threshold.
    Above,
    /// At or below the threshold.
    Below,
}

impl SegmentStyle {
    pub fn color(&self) -> Color {
        match self {
            SegmentStyle::Selected => Color::opaque(0x3D, 0x99, 0x70),
            SegmentStyle::Above => Color::opaque(0xFF, 0xDC, 0x00),
            SegmentStyle::Below => Color::new(0xFF, 0xDC, 0x00, 102),
        }
    }
}

/// Style of the segment ending at `end`.
pub fn segment_style(end: &SeriesPoint, threshold: f64, selected: &DateTime<Utc>) -> SegmentStyle {
    if same_day(&end.time, selected) {
        SegmentStyle::Selected
    } else if end.value > threshold {
        SegmentStyle::Above
    } else {
        SegmentStyle::Below
    }
}

/// Styles for every segment of a series; segment `i` joins points `i` and `i + 1`.
pub fn segment_styles(
    series: &[SeriesPoint],
    threshold: f64,
    selected: &DateTime<Utc>,
) -> Vec<SegmentStyle> {
    series
        .iter()
        .skip(1)
        .map(|end| segment_style(end, threshold, selected))
        .collect()
}
