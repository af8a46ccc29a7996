//! Heatmap colour ramp over normalised intensity.

use serde::{Deserialize, Serialize, Serializer};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// CSS colour string: `#rrggbb` when opaque, `rgba(r,g,b,a)` otherwise.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                (self.a as f64 / 255.0 * 100.0).round() / 100.0
            )
        }
    }
}

/// Serialised as its CSS string, the form the map layer consumes.
impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f64 * t_inv) + (color2.r as f64 * t)).round() as u8,
        ((color1.g as f64 * t_inv) + (color2.g as f64 * t)).round() as u8,
        ((color1.b as f64 * t_inv) + (color2.b as f64 * t)).round() as u8,
        ((color1.a as f64 * t_inv) + (color2.a as f64 * t)).round() as u8,
    )
}

/// A colour anchored at an intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStop {
    pub at: f64,
    pub color: Color,
}

/// Piecewise-linear ramp from transparent through yellow, orange and red to
/// maroon. Serialises as its list of stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HeatmapRamp {
    stops: Vec<ColorStop>,
}

/// Heatmap display settings shared with the map collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapStyle {
    /// Point radius in pixels.
    pub radius: u32,
    pub opacity: f64,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            radius: 10,
            opacity: 0.7,
        }
    }
}

impl HeatmapRamp {
    /// Stops at 0, 30 %, 60 %, 80 % and 100 % of `max_intensity`.
    pub fn sargassum(max_intensity: f64) -> Self {
        Self {
            stops: vec![
                ColorStop {
                    at: 0.0,
                    color: Color::transparent(),
                },
                ColorStop {
                    at: max_intensity * 0.3,
                    color: Color::opaque(0xFF, 0xDC, 0x00),
                },
                ColorStop {
                    at: max_intensity * 0.6,
                    color: Color::opaque(0xFF, 0x85, 0x1B),
                },
                ColorStop {
                    at: max_intensity * 0.8,
                    color: Color::opaque(0xFF, 0x41, 0x36),
                },
                ColorStop {
                    at: max_intensity,
                    color: Color::opaque(0x85, 0x14, 0x4B),
                },
            ],
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Colour at an intensity; clamps to the first and last stop.
    pub fn color_at(&self, intensity: f64) -> Color {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Color::transparent(),
        };
        if intensity <= first.at {
            return first.color;
        }
        if intensity >= last.at {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if intensity <= hi.at {
                let span = hi.at - lo.at;
                let t = if span > 0.0 {
                    (intensity - lo.at) / span
                } else {
                    1.0
                };
                return interpolate_color(lo.color, hi.color, t);
            }
        }
        last.color
    }
}

impl Default for HeatmapRamp {
    fn default() -> Self {
        Self::sargassum(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_stop_colors() {
        let ramp = HeatmapRamp::default();
        assert_eq!(ramp.color_at(0.0), Color::transparent());
        assert_eq!(ramp.color_at(0.3).to_css(), "#FFDC00");
        assert_eq!(ramp.color_at(0.6).to_css(), "#FF851B");
        assert_eq!(ramp.color_at(0.8).to_css(), "#FF4136");
        assert_eq!(ramp.color_at(1.0).to_css(), "#85144B");
    }

    #[test]
    fn test_ramp_clamps() {
        let ramp = HeatmapRamp::default();
        assert_eq!(ramp.color_at(-1.0), Color::transparent());
        assert_eq!(ramp.color_at(7.0), ramp.color_at(1.0));
    }

    #[test]
    fn test_ramp_interpolates_between_stops() {
        let ramp = HeatmapRamp::default();
        let mid = ramp.color_at(0.4);
        // a third of the way from #FFDC00 to #FF851B
        assert_eq!(mid.r, 0xFF);
        assert_eq!(mid.g, 191);
        assert_eq!(mid.b, 9);
        assert_eq!(mid.a, 255);
    }

    #[test]
    fn test_css_with_alpha() {
        assert_eq!(Color::new(255, 220, 0, 102).to_css(), "rgba(255,220,0,0.4)");
    }

    #[test]
    fn test_ramp_serialises_as_css_stops() {
        let json = serde_json::to_value(HeatmapRamp::default()).unwrap();
        let stops = json.as_array().unwrap();
        assert_eq!(stops.len(), 5);
        assert_eq!(stops[0]["color"], "rgba(0,0,0,0)");
        assert_eq!(stops[1]["at"], 0.3);
        assert_eq!(stops[1]["color"], "#FFDC00");
        assert_eq!(stops[4]["color"], "#85144B");
    }
}
