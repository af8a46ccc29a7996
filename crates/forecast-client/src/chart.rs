//! Chart datasets and the JSON handed to the chart collaborator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use density_analysis::segment_styles;
use sargassum_common::{ForecastSeries, ForecastWindow, SeriesPoint};

use crate::coordinator::SeriesSlot;

const PREVIOUS_BORDER: &str = "rgba(255,255,255,0.4)";

impl SeriesSlot {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesSlot::Current => "Current forecast",
            SeriesSlot::Previous => "Previous forecast",
        }
    }
}

/// The series shown on the chart, keyed by slot.
///
/// Every write bumps the slot's revision, so callers can tell whether a
/// dataset was replaced.
#[derive(Debug, Default)]
pub struct ChartDatasets {
    series: HashMap<SeriesSlot, ForecastSeries>,
    revisions: HashMap<SeriesSlot, u64>,
}

impl ChartDatasets {
    pub fn get(&self, slot: SeriesSlot) -> Option<&ForecastSeries> {
        self.series.get(&slot)
    }

    /// Number of writes (set or remove) the slot has seen.
    pub fn revision(&self, slot: SeriesSlot) -> u64 {
        self.revisions.get(&slot).copied().unwrap_or(0)
    }

    pub fn set(&mut self, slot: SeriesSlot, series: ForecastSeries) {
        self.series.insert(slot, series);
        *self.revisions.entry(slot).or_insert(0) += 1;
    }

    pub fn remove(&mut self, slot: SeriesSlot) -> Option<ForecastSeries> {
        let removed = self.series.remove(&slot);
        if removed.is_some() {
            *self.revisions.entry(slot).or_insert(0) += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        for slot in SeriesSlot::ALL {
            self.remove(slot);
        }
    }
}

/// One dataset as the chart collaborator expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPayload {
    pub id: SeriesSlot,
    pub label: &'static str,
    pub data: Vec<SeriesPoint>,
    /// Colour of each segment; segment `i` ends on point `i + 1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<&'static str>,
}

/// Horizontal reference line at the threshold.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdLine {
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    /// Previous forecast first so the current one draws on top.
    pub datasets: Vec<DatasetPayload>,
    pub threshold: ThresholdLine,
    pub selected_date: DateTime<Utc>,
}

impl ChartPayload {
    pub fn dataset(&self, slot: SeriesSlot) -> Option<&DatasetPayload> {
        self.datasets.iter().find(|d| d.id == slot)
    }
}

/// Assemble the chart payload. The previous dataset appears only when
/// `show_previous` is set and a previous series has been loaded.
pub fn chart_payload(
    datasets: &ChartDatasets,
    show_previous: bool,
    threshold: f64,
    selected_date: DateTime<Utc>,
) -> ChartPayload {
    let mut out = Vec::with_capacity(2);

    if show_previous {
        if let Some(previous) = datasets.get(SeriesSlot::Previous) {
            out.push(DatasetPayload {
                id: SeriesSlot::Previous,
                label: SeriesSlot::Previous.label(),
                data: previous.points().to_vec(),
                segment_colors: None,
                border_color: Some(PREVIOUS_BORDER),
            });
        }
    }

    let current = datasets
        .get(SeriesSlot::Current)
        .map(|s| s.points().to_vec())
        .unwrap_or_default();
    let colors = segment_styles(&current, threshold, &selected_date)
        .into_iter()
        .map(|style| style.color().to_css())
        .collect();
    out.push(DatasetPayload {
        id: SeriesSlot::Current,
        label: SeriesSlot::Current.label(),
        data: current,
        segment_colors: Some(colors),
        border_color: None,
    });

    ChartPayload {
        datasets: out,
        threshold: ThresholdLine {
            y_min: threshold,
            y_max: threshold,
        },
        selected_date,
    }
}

/// Slider offset for a click on chart point `index`.
///
/// The chart may start before the window; the offset is measured from the
/// point that falls on the window's first day. `None` when that day is not
/// in the series or the index is out of range.
pub fn click_to_offset(series: &ForecastSeries, index: usize, window: &ForecastWindow) -> Option<u32> {
    if index >= series.len() {
        return None;
    }
    let start = series.position_of_day(&window.start)?;
    Some(window.clamp_offset(index as i64 - start as i64))
}
