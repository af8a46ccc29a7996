//! Common types and utilities shared across the sargassum viewer crates.

pub mod bbox;
pub mod eez;
pub mod error;
pub mod geojson;
pub mod sample;
pub mod series;
pub mod time;

pub use bbox::BoundingBox;
pub use eez::{EezCatalog, EezFeature, NO_SELECTION};
pub use error::{ViewerError, ViewerResult};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use sample::SamplePoint;
pub use series::{ForecastSeries, SeriesPoint};
pub use time::{ForecastWindow, TimeParseError};
