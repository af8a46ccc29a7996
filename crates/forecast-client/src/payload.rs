//! Decoding of forecast API response bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use sargassum_common::time::parse_forecast_time;
use sargassum_common::{
    FeatureCollection, ForecastSeries, Geometry, SamplePoint, SeriesPoint, ViewerError,
    ViewerResult,
};

/// Body of the volume endpoint.
#[derive(Debug, Deserialize)]
pub struct VolumePayload {
    /// Absent in some error responses; treated as an empty series.
    #[serde(default)]
    pub values: Vec<VolumeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeEntry {
    pub date: String,
    #[serde(rename = "m2PerKm2")]
    pub m2_per_km2: f64,
}

/// Properties of one feature of the point-sample payload.
#[derive(Debug, Deserialize)]
pub struct PointProperties {
    /// Raw density.
    pub value: Option<f64>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Decode a volume body into a sorted, de-duplicated series.
pub fn decode_volume(body: &str) -> ViewerResult<ForecastSeries> {
    let payload: VolumePayload = serde_json::from_str(body)?;

    let points = payload
        .values
        .into_iter()
        .map(|entry| {
            let time = parse_forecast_time(&entry.date)?;
            Ok(SeriesPoint::new(time, entry.m2_per_km2))
        })
        .collect::<ViewerResult<Vec<_>>>()?;

    Ok(ForecastSeries::from_points(points))
}

/// Decode a point-sample body.
///
/// Samples take their time from `properties.time` when present and from
/// `requested` otherwise. Features without a point geometry, properties or a
/// value are skipped, as are non-point geometries and positions with fewer
/// than two coordinates.
pub fn decode_samples(body: &str, requested: DateTime<Utc>) -> ViewerResult<Vec<SamplePoint>> {
    let collection: FeatureCollection<PointProperties> = serde_json::from_str(body)?;
    let total = collection.len();

    let mut samples = Vec::with_capacity(total);
    for feature in collection.features {
        let Some((lon, lat)) = feature.geometry.as_ref().and_then(Geometry::as_lon_lat) else {
            continue;
        };
        let Some(properties) = feature.properties else {
            continue;
        };
        let Some(value) = properties.value else {
            continue;
        };

        let timestamp = match properties.time.as_deref() {
            Some(raw) => parse_forecast_time(raw)
                .map_err(|e| ViewerError::InvalidPayload(format!("sample time: {}", e)))?,
            None => requested,
        };

        samples.push(SamplePoint::new(lon, lat, timestamp, value));
    }

    if samples.len() < total {
        debug!(
            total,
            kept = samples.len(),
            "Skipped point features without point geometry or value"
        );
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_volume_sorts_and_parses() {
        let body = r#"{"values":[
            {"date":"2025-05-02T12:00:00Z","m2PerKm2":12.5},
            {"date":"2025-05-01T12:00:00Z","m2PerKm2":3}
        ]}"#;
        let series = decode_volume(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.points()[0].time,
            Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(series.points()[1].value, 12.5);
    }

    #[test]
    fn test_decode_volume_missing_values_is_empty() {
        assert!(decode_volume("{}").unwrap().is_empty());
    }

    #[test]
    fn test_decode_volume_rejects_bad_dates_and_json() {
        let bad_date = r#"{"values":[{"date":"yesterday","m2PerKm2":1}]}"#;
        assert!(matches!(decode_volume(bad_date), Err(ViewerError::InvalidDate(_))));
        assert!(matches!(decode_volume("<html>"), Err(ViewerError::InvalidPayload(_))));
    }

    #[test]
    fn test_decode_samples() {
        let requested = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-61.5,16.25]},
             "properties":{"value":0.04}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-61.25,16.25]},
             "properties":{"value":0.08,"time":"2025-05-01T00:00:00Z"}},
            {"type":"Feature","geometry":null,"properties":{"value":1.0}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{}}
        ]}"#;

        let samples = decode_samples(body, requested).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], SamplePoint::new(-61.5, 16.25, requested, 0.04));
        assert_eq!(
            samples[1].timestamp,
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_samples_skips_unusual_features() {
        let requested = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-61.5,16.25,0.0]},
             "properties":{"value":0.04}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-61.0,16.0]},
             "properties":null},
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},
             "properties":{"value":0.5}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[7.0]},
             "properties":{"value":0.5}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-60.75,16.0]},
             "properties":{"value":0.06}}
        ]}"#;

        let samples = decode_samples(body, requested).unwrap();
        assert_eq!(
            samples,
            vec![
                SamplePoint::new(-61.5, 16.25, requested, 0.04),
                SamplePoint::new(-60.75, 16.0, requested, 0.06),
            ]
        );
    }

    #[test]
    fn test_decode_samples_without_features() {
        let requested = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert!(decode_samples(r#"{"type":"FeatureCollection"}"#, requested)
            .unwrap()
            .is_empty());
    }
}
