//! Canned payloads matching what the forecast API and boundary source serve.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use sargassum_common::SeriesPoint;

/// EEZ names used across the test suite.
pub mod eez {
    pub const GUADELOUPE: &str = "French Exclusive Economic Zone (Guadeloupe)";
    pub const MARTINIQUE: &str = "French Exclusive Economic Zone (Martinique)";

    pub const GUADELOUPE_AREA_KM2: f64 = 95_978.0;
    pub const MARTINIQUE_AREA_KM2: f64 = 47_640.0;
}

/// Boundary source with two EEZs: Guadeloupe as a MultiPolygon, Martinique
/// as a Polygon.
pub fn eez_geojson() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "properties": {
                    "GEONAME": eez::GUADELOUPE,
                    "AREA_KM2": eez::GUADELOUPE_AREA_KM2
                },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[-62.8, 15.8], [-60.0, 15.8], [-60.0, 18.5], [-62.8, 18.5], [-62.8, 15.8]]],
                        [[[-63.5, 16.0], [-63.0, 16.0], [-63.0, 16.4], [-63.5, 16.0]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "id": 2,
                "properties": {
                    "GEONAME": eez::MARTINIQUE,
                    "AREA_KM2": eez::MARTINIQUE_AREA_KM2
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[-62.0, 13.8], [-59.5, 13.8], [-59.5, 15.6], [-62.0, 15.6], [-62.0, 13.8]]
                    ]
                }
            }
        ]
    })
    .to_string()
}

/// Volume endpoint body for a series.
pub fn volume_json(points: &[SeriesPoint]) -> String {
    let values: Vec<Value> = points
        .iter()
        .map(|p| json!({ "date": p.time.to_rfc3339(), "m2PerKm2": p.value }))
        .collect();
    json!({ "values": values }).to_string()
}

/// Point-sample endpoint body; each sample is `(lon, lat, raw_value)`.
pub fn points_json(samples: &[(f64, f64, f64)], time: Option<DateTime<Utc>>) -> String {
    let features: Vec<Value> = samples
        .iter()
        .map(|(lon, lat, value)| {
            let mut properties = json!({ "value": value });
            if let Some(t) = time {
                properties["time"] = json!(t.to_rfc3339());
            }
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [lon, lat] },
                "properties": properties
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Point-sample body with no `features` member.
pub fn points_json_without_features() -> String {
    json!({ "type": "FeatureCollection" }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::daily_series;

    #[test]
    fn test_volume_json_shape() {
        let series = daily_series("2025-06-01", &[1.0, 2.5]);
        let v: Value = serde_json::from_str(&volume_json(&series)).unwrap();
        assert_eq!(v["values"].as_array().unwrap().len(), 2);
        assert_eq!(v["values"][1]["m2PerKm2"], 2.5);
    }

    #[test]
    fn test_points_json_shape() {
        let v: Value = serde_json::from_str(&points_json(&[(-61.0, 16.0, 0.05)], None)).unwrap();
        assert_eq!(v["features"][0]["geometry"]["coordinates"][0], -61.0);
        assert!(v["features"][0]["properties"].get("time").is_none());
    }
}
