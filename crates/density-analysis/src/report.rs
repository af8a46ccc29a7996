//! Human-readable labels for the statistics panel.

use serde::Serialize;

use sargassum_common::time::format_human_date;
use sargassum_common::NO_SELECTION;

use crate::statistics::{Intersection, SeriesStatistics};

/// Text shown in the statistics panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReport {
    /// `"<date> (<value> m2/km2)"`.
    pub peak: String,
    /// One line per covering period.
    pub periods: Vec<String>,
    /// `"<fields> x soccer fields, <tons> T"`.
    pub visual_measure: String,
}

impl StatisticsReport {
    /// Report with placeholders everywhere, shown before any series is loaded.
    pub fn placeholder() -> Self {
        Self {
            peak: NO_SELECTION.to_string(),
            periods: vec![NO_SELECTION.to_string()],
            visual_measure: NO_SELECTION.to_string(),
        }
    }

    pub fn from_statistics(stats: &SeriesStatistics) -> Self {
        let mut report = Self::placeholder();

        if let Some(peak) = stats.peak {
            report.peak = format!(
                "{} ({} m2/km2)",
                format_human_date(&peak.time),
                peak.value.trunc() as i64
            );
        }

        if !stats.intersections.is_empty() {
            report.periods = stats.intersections.iter().map(period_label).collect();
        }

        if let Some(m) = stats.visual_measure {
            report.visual_measure = format!("{} x soccer fields, {} T", m.field_count, m.tone_weight);
        }

        report
    }
}

impl Default for StatisticsReport {
    fn default() -> Self {
        Self::placeholder()
    }
}

fn period_label(run: &Intersection) -> String {
    match run.end {
        Some(end) => format!(
            "From {} to {}",
            format_human_date(&run.start.time),
            format_human_date(&end.time)
        ),
        None => format!("From {}", format_human_date(&run.start.time)),
    }
}
