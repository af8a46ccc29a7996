//! Exclusive Economic Zone boundary catalog.
//!
//! The catalog is loaded once from a static GeoJSON FeatureCollection keyed by
//! `properties.GEONAME`. It is read-only for the lifetime of a session.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{ViewerError, ViewerResult};
use crate::geojson::{FeatureCollection, Geometry};

/// Dropdown sentinel meaning "no EEZ selected".
pub const NO_SELECTION: &str = "---";

/// Properties carried by each boundary feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EezProperties {
    #[serde(rename = "GEONAME")]
    pub geoname: String,

    #[serde(rename = "AREA_KM2", default)]
    pub area_km2: f64,
}

/// One EEZ boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct EezFeature {
    pub name: String,
    pub area_km2: f64,
    pub geometry: Option<Geometry>,
}

impl EezFeature {
    /// Bounding box over every exterior ring, for fitting the map view.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let geometry = self.geometry.as_ref()?;
        BoundingBox::enclosing(
            geometry
                .exterior_rings()
                .into_iter()
                .flat_map(|ring| ring.iter().copied()),
        )
    }
}

/// All known EEZ boundaries, in source order.
#[derive(Debug, Clone, Default)]
pub struct EezCatalog {
    features: Vec<EezFeature>,
    by_name: HashMap<String, usize>,
}

impl EezCatalog {
    /// Parse a boundary FeatureCollection.
    ///
    /// Duplicate GEONAMEs are rejected since the name is the selection key.
    pub fn from_geojson_str(json: &str) -> ViewerResult<Self> {
        let collection: FeatureCollection<EezProperties> = serde_json::from_str(json)
            .map_err(|e| ViewerError::InvalidBoundarySource(e.to_string()))?;

        let mut catalog = EezCatalog::default();
        for feature in collection.features {
            let Some(properties) = feature.properties else {
                return Err(ViewerError::InvalidBoundarySource(
                    "feature without properties".to_string(),
                ));
            };
            let name = properties.geoname;
            if catalog.by_name.contains_key(&name) {
                return Err(ViewerError::InvalidBoundarySource(format!(
                    "duplicate GEONAME '{}'",
                    name
                )));
            }
            catalog.by_name.insert(name.clone(), catalog.features.len());
            catalog.features.push(EezFeature {
                name,
                area_km2: properties.area_km2,
                geometry: feature.geometry,
            });
        }
        Ok(catalog)
    }

    /// Load a boundary FeatureCollection from disk.
    pub fn from_path(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ViewerError::InvalidBoundarySource(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_geojson_str(&content)
    }

    /// Look up an EEZ by GEONAME.
    pub fn get(&self, name: &str) -> ViewerResult<&EezFeature> {
        self.by_name
            .get(name)
            .map(|&i| &self.features[i])
            .ok_or_else(|| ViewerError::EezNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Names in source order, as offered to the selection dropdown.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EezFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
