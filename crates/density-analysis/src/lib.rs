//! Analysis of sargassum density forecasts.
//!
//! - [`normalize`]: raw density to a bounded [0, 1] intensity
//! - [`grid`]: point samples to square polygons for area-fill rendering
//! - [`ramp`]: heatmap colour stops over normalised intensity
//! - [`statistics`]: peak and threshold-crossing periods of a series
//! - [`segments`]: per-segment chart styling against the threshold
//! - [`report`]: human-readable statistics labels

pub mod grid;
pub mod normalize;
pub mod ramp;
pub mod report;
pub mod segments;
pub mod statistics;

pub use grid::{build_grid, GridCell, GridCellProperties, CELL_HALF_WIDTH};
pub use normalize::{log_normalize, normalize, DensityScale};
pub use ramp::{Color, ColorStop, HeatmapRamp, HeatmapStyle};
pub use report::StatisticsReport;
pub use segments::{segment_style, segment_styles, SegmentStyle};
pub use statistics::{
    compute_statistics, visual_measure, Intersection, ScanBoundary, SeriesStatistics,
    StatisticsEngine, VisualMeasure,
};
