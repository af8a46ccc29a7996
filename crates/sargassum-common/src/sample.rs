//! Point samples decoded from the forecast point-sample payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single density sample at a coordinate and time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Raw density, before normalisation.
    pub raw_value: f64,
}

impl SamplePoint {
    pub fn new(longitude: f64, latitude: f64, timestamp: DateTime<Utc>, raw_value: f64) -> Self {
        Self {
            longitude,
            latitude,
            timestamp,
            raw_value,
        }
    }
}
