//! Viewer configuration.
//!
//! Loaded from an optional YAML file, then overridden from the environment
//! (`SARGASSUM_API_URL`, `SARGASSUM_EEZ_SOURCE`, `SARGASSUM_THRESHOLD`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use density_analysis::{DensityScale, HeatmapStyle, ScanBoundary};
use forecast_client::{PlaybackSettings, SessionSettings, DEFAULT_THRESHOLD};
use sargassum_common::ForecastWindow;
use serde::Deserialize;
use tracing::{debug, info};

pub const ENV_API_URL: &str = "SARGASSUM_API_URL";
pub const ENV_EEZ_SOURCE: &str = "SARGASSUM_EEZ_SOURCE";
pub const ENV_THRESHOLD: &str = "SARGASSUM_THRESHOLD";

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// GeoJSON FeatureCollection of EEZ polygons.
    #[serde(default = "default_eez_source")]
    pub eez_source: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub density: DensityScale,
    /// Forecast window length in months, counted from today.
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default = "default_initial_eez")]
    pub initial_eez: String,
    #[serde(default = "default_heatmap_radius")]
    pub heatmap_radius: u32,
    #[serde(default)]
    pub scan_boundary: ScanBoundary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_day_step")]
    pub day_step: u32,
}

fn default_api_url() -> String {
    "https://sargassum-backend.lab.dive.edito.eu/forecast".to_string()
}

fn default_eez_source() -> PathBuf {
    PathBuf::from("data/eez_reduced.json")
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_window_months() -> u32 {
    7
}

fn default_initial_eez() -> String {
    "French Exclusive Economic Zone (Guadeloupe)".to_string()
}

fn default_heatmap_radius() -> u32 {
    10
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_day_step() -> u32 {
    1
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            day_step: default_day_step(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            eez_source: default_eez_source(),
            request_timeout_secs: default_request_timeout_secs(),
            threshold: default_threshold(),
            density: DensityScale::default(),
            window_months: default_window_months(),
            animation: AnimationConfig::default(),
            initial_eez: default_initial_eez(),
            heatmap_radius: default_heatmap_radius(),
            scan_boundary: ScanBoundary::default(),
        }
    }
}

impl ViewerConfig {
    /// Load from `path` if given, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded viewer config");
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(source) = lookup(ENV_EEZ_SOURCE) {
            self.eez_source = PathBuf::from(source);
        }
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            self.threshold = raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {:?}", ENV_THRESHOLD, raw))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.animation.delay_ms == 0 {
            bail!("animation.delay_ms must be positive");
        }
        if self.animation.day_step == 0 {
            bail!("animation.day_step must be positive");
        }
        if self.window_months == 0 {
            bail!("window_months must be positive");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        if !self.density.is_valid() {
            bail!(
                "density.max must be greater than density.min ({} .. {})",
                self.density.min,
                self.density.max
            );
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            bail!("threshold must be a non-negative number, got {}", self.threshold);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn playback(&self) -> PlaybackSettings {
        PlaybackSettings {
            delay: Duration::from_millis(self.animation.delay_ms),
            day_step: self.animation.day_step,
        }
    }

    pub fn session_settings(&self, window: ForecastWindow) -> SessionSettings {
        SessionSettings {
            window,
            threshold: self.threshold,
            density: self.density,
            scan_boundary: self.scan_boundary,
            heatmap: HeatmapStyle {
                radius: self.heatmap_radius,
                ..HeatmapStyle::default()
            },
        }
    }
}
