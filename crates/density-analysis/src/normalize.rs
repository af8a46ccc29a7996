//! Density normalisation.
//!
//! Sargassum density is heavily skewed towards zero, so the map uses a
//! log-scaled intensity. Both variants clamp the input into `[min, max]`
//! first, so anything at or below `min` maps to 0 and anything at or above
//! `max` maps to 1.

use serde::{Deserialize, Serialize};

/// Default lower bound of the density scale (m2/km2 fraction).
pub const DEFAULT_MIN_DENSITY: f64 = 0.0001;

/// Default upper bound of the density scale.
pub const DEFAULT_MAX_DENSITY: f64 = 0.2;

// Not f64::clamp: that panics on inverted or NaN bounds.
fn clamp_density(raw: f64, min: f64, max: f64) -> f64 {
    let mut v = raw;
    if v <= min {
        v = min;
    }
    if v >= max {
        v = max;
    }
    v
}

/// Linear normalisation: `(v - min) / (max - min)` after clamping.
pub fn normalize(raw: f64, min: f64, max: f64) -> f64 {
    let v = clamp_density(raw, min, max);
    (v - min) / (max - min)
}

/// Log normalisation: `ln(v - min + 1) / ln(max - min + 1)` after clamping.
pub fn log_normalize(raw: f64, min: f64, max: f64) -> f64 {
    let v = clamp_density(raw, min, max);
    (v - min).ln_1p() / (max - min).ln_1p()
}

/// A density range with its normalisation functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityScale {
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

fn default_min() -> f64 {
    DEFAULT_MIN_DENSITY
}

fn default_max() -> f64 {
    DEFAULT_MAX_DENSITY
}

impl Default for DensityScale {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DENSITY,
            max: DEFAULT_MAX_DENSITY,
        }
    }
}

impl DensityScale {
    /// Create a scale. Callers validate `min < max`; see [`DensityScale::is_valid`].
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A usable scale has finite bounds with `min < max`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    pub fn linear(&self, raw: f64) -> f64 {
        normalize(raw, self.min, self.max)
    }

    pub fn log(&self, raw: f64) -> f64 {
        log_normalize(raw, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f64 = DEFAULT_MIN_DENSITY;
    const MAX: f64 = DEFAULT_MAX_DENSITY;

    #[test]
    fn test_clamping_at_bounds() {
        assert_eq!(normalize(MIN - 1.0, MIN, MAX), 0.0);
        assert_eq!(normalize(MIN, MIN, MAX), 0.0);
        assert_eq!(normalize(MAX + 1.0, MIN, MAX), 1.0);
        assert_eq!(normalize(MAX, MIN, MAX), 1.0);

        assert_eq!(log_normalize(MIN - 1.0, MIN, MAX), 0.0);
        assert_eq!(log_normalize(MIN, MIN, MAX), 0.0);
        assert_eq!(log_normalize(MAX + 1.0, MIN, MAX), 1.0);
        assert_eq!(log_normalize(MAX, MIN, MAX), 1.0);
    }

    #[test]
    fn test_monotonic_within_range() {
        let steps = 200;
        let mut prev_lin = f64::NEG_INFINITY;
        let mut prev_log = f64::NEG_INFINITY;
        for i in 0..=steps {
            let v = MIN + (MAX - MIN) * i as f64 / steps as f64;
            let lin = normalize(v, MIN, MAX);
            let log = log_normalize(v, MIN, MAX);
            assert!(lin >= prev_lin, "linear not monotonic at {}", v);
            assert!(log >= prev_log, "log not monotonic at {}", v);
            assert!((0.0..=1.0).contains(&lin));
            assert!((0.0..=1.0).contains(&log));
            prev_lin = lin;
            prev_log = log;
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let scale = DensityScale::new(0.0, 10.0);
        assert!((scale.linear(5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_matches_formula() {
        let scale = DensityScale::default();
        let v = 0.05;
        let expected = (v - MIN + 1.0).ln() / (MAX - MIN + 1.0).ln();
        assert!((scale.log(v) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_scale_validity() {
        assert!(DensityScale::default().is_valid());
        assert!(!DensityScale::new(0.2, 0.1).is_valid());
        assert!(!DensityScale::new(0.0, f64::NAN).is_valid());
    }
}
