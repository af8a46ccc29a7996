//! Axis-aligned bounding boxes in geographic degrees.

use serde::{Deserialize, Serialize};

/// A geographic bounding box (EPSG:4326, degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every `[lon, lat]` position.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        positions.into_iter().fold(None, |acc, [x, y]| {
            Some(match acc {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(
                    b.min_x.min(x),
                    b.min_y.min(y),
                    b.max_x.max(x),
                    b.max_y.max(y),
                ),
            })
        })
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point as `[lon, lat]`.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Corner pair `[[min_lon, min_lat], [max_lon, max_lat]]`, the shape map
    /// widgets take for fit-to-bounds.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.min_x, self.min_y], [self.max_x, self.max_y]]
    }
}
