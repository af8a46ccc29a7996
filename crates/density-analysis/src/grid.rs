//! Reconstruction of point samples into square grid cells.
//!
//! The forecast point payload carries one sample per 0.25° model cell. Each
//! sample is drawn as an independent square centred on its coordinate;
//! overlaps are left to the map renderer's blending.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sargassum_common::{Feature, FeatureCollection, Geometry, SamplePoint};

use crate::normalize::DensityScale;

/// Half the side length of a grid cell, in degrees.
pub const CELL_HALF_WIDTH: f64 = 0.125;

/// Below this many samples the rayon split costs more than it saves.
const PARALLEL_THRESHOLD: usize = 4096;

/// A closed square polygon around one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// SW, SE, NE, NW, SW.
    pub ring: [[f64; 2]; 5],
    /// Log-normalised intensity in [0, 1].
    pub value: f64,
    pub time: DateTime<Utc>,
}

/// Properties attached to each cell when exported as GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCellProperties {
    pub value: f64,
    pub time: DateTime<Utc>,
}

impl GridCell {
    /// Square of half-width [`CELL_HALF_WIDTH`] centred on `(lon, lat)`.
    pub fn centered(lon: f64, lat: f64, value: f64, time: DateTime<Utc>) -> Self {
        let h = CELL_HALF_WIDTH;
        Self {
            ring: [
                [lon - h, lat - h],
                [lon + h, lat - h],
                [lon + h, lat + h],
                [lon - h, lat + h],
                [lon - h, lat - h],
            ],
            value,
            time,
        }
    }

    /// Cell center as `[lon, lat]`.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.ring[0][0] + self.ring[2][0]) / 2.0,
            (self.ring[0][1] + self.ring[2][1]) / 2.0,
        ]
    }

    pub fn to_feature(&self) -> Feature<GridCellProperties> {
        Feature::new(
            Geometry::polygon(self.ring.to_vec()),
            GridCellProperties {
                value: self.value,
                time: self.time,
            },
        )
    }
}

fn cell_for(point: &SamplePoint, scale: &DensityScale) -> GridCell {
    GridCell::centered(
        point.longitude,
        point.latitude,
        scale.log(point.raw_value),
        point.timestamp,
    )
}

/// Build one cell per sample, in input order.
///
/// Each raw value is log-normalised exactly once here; cells are the only
/// carrier of normalised values, so nothing downstream normalises again.
pub fn build_grid(points: &[SamplePoint], scale: &DensityScale) -> Vec<GridCell> {
    let parallel = points.len() >= PARALLEL_THRESHOLD;
    debug!(samples = points.len(), parallel, "Building density grid");

    if parallel {
        points.par_iter().map(|p| cell_for(p, scale)).collect()
    } else {
        points.iter().map(|p| cell_for(p, scale)).collect()
    }
}

/// Export cells as the GeoJSON source consumed by the map collaborator.
pub fn to_feature_collection(cells: &[GridCell]) -> FeatureCollection<GridCellProperties> {
    FeatureCollection::new().with_features(cells.iter().map(GridCell::to_feature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_single_point_cell() {
        let points = [SamplePoint::new(10.0, 5.0, noon(), 0.3)];
        let cells = build_grid(&points, &DensityScale::default());

        assert_eq!(cells.len(), 1);
        assert_eq!(
            cells[0].ring,
            [
                [9.875, 4.875],
                [10.125, 4.875],
                [10.125, 5.125],
                [9.875, 5.125],
                [9.875, 4.875],
            ]
        );
        assert_eq!(cells[0].ring[0], cells[0].ring[4]);
        // 0.3 is above the default max, so it saturates
        assert_eq!(cells[0].value, 1.0);
        assert_eq!(cells[0].time, noon());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_grid(&[], &DensityScale::default()).is_empty());
    }

    #[test]
    fn test_overlapping_points_are_not_merged() {
        let points = [
            SamplePoint::new(0.0, 0.0, noon(), 0.01),
            SamplePoint::new(0.1, 0.0, noon(), 0.02),
            SamplePoint::new(0.0, 0.0, noon(), 0.01),
        ];
        let cells = build_grid(&points, &DensityScale::default());
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], cells[2]);
        assert_eq!(cells[1].center(), [0.1, 0.0]);
    }

    #[test]
    fn test_feature_export() {
        let cells = build_grid(
            &[SamplePoint::new(-60.0, 15.0, noon(), 0.0)],
            &DensityScale::default(),
        );
        let fc = to_feature_collection(&cells);
        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(
            json["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .unwrap()
                .len(),
            5
        );
        assert_eq!(json["features"][0]["properties"]["value"], 0.0);
    }
}
