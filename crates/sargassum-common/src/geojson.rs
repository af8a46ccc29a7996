//! GeoJSON wire types.
//!
//! Only the subset the viewer exchanges is modelled: point samples coming in
//! from the forecast API, EEZ boundaries from the static source, and grid
//! polygons going out to the map collaborator. Properties are generic so each
//! payload declares its own typed property struct.

use serde::{Deserialize, Serialize};

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// A GeoJSON FeatureCollection.
///
/// A payload without a `features` member decodes as an empty collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection<P> {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type", default = "feature_collection_type")]
    pub type_: String,

    /// Array of features.
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: feature_collection_type(),
            features: Vec::new(),
        }
    }

    /// Add multiple features to the collection.
    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature<P>>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature<P> {
    /// Type identifier (always "Feature").
    #[serde(rename = "type", default = "feature_type")]
    pub type_: String,

    /// Optional feature identifier (string or number in the wild).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    /// The geometry of this feature. `null` geometries are allowed by GeoJSON.
    pub geometry: Option<Geometry>,

    /// Typed properties; `null` or absent decodes as `None`.
    #[serde(default = "Option::default")]
    pub properties: Option<P>,
}

impl<P> Feature<P> {
    /// Create a feature with the given geometry and properties.
    pub fn new(geometry: Geometry, properties: P) -> Self {
        Self {
            type_: feature_type(),
            id: None,
            geometry: Some(geometry),
            properties: Some(properties),
        }
    }
}

/// GeoJSON geometry types used by the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry, `[longitude, latitude, ...]`. Extra elements
    /// (altitude) are carried but unused.
    Point { coordinates: Vec<f64> },

    /// A polygon: first ring is the exterior, the rest are holes.
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },

    /// A collection of polygons.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },

    /// Any other geometry type. Its members are ignored.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: vec![lon, lat],
        }
    }

    /// `(lon, lat)` of a point with at least two coordinates.
    pub fn as_lon_lat(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } if coordinates.len() >= 2 => {
                Some((coordinates[0], coordinates[1]))
            }
            _ => None,
        }
    }

    /// Create a single-ring polygon geometry.
    pub fn polygon(ring: Vec<[f64; 2]>) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Exterior rings of every polygon part. Points have none.
    pub fn exterior_rings(&self) -> Vec<&[[f64; 2]]> {
        match self {
            Geometry::Point { .. } | Geometry::Unsupported => Vec::new(),
            Geometry::Polygon { coordinates } => {
                coordinates.first().map(|r| r.as_slice()).into_iter().collect()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|poly| poly.first().map(|r| r.as_slice()))
                .collect(),
        }
    }
}
