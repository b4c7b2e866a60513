use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Srgb};

use dengue_viewer::synthetic::RiskCategory;

/// Fill for regions without data.
pub const NO_DATA: Color32 = Color32::from_rgb(60, 60, 60);

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` distinct warm colours, evenly spaced from red to amber.
pub fn warm_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 45.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential scale: value → Color32
// ---------------------------------------------------------------------------

/// Piecewise-linear colour ramp interpolated in linear RGB.
#[derive(Debug, Clone)]
pub struct ColorScale {
    stops: Vec<LinSrgb>,
}

impl ColorScale {
    fn from_hex(stops: &[u32]) -> Self {
        let stops = stops
            .iter()
            .map(|&hex| {
                let srgb = Srgb::new(
                    ((hex >> 16) & 0xff) as f32 / 255.0,
                    ((hex >> 8) & 0xff) as f32 / 255.0,
                    (hex & 0xff) as f32 / 255.0,
                );
                srgb.into_linear()
            })
            .collect();
        ColorScale { stops }
    }

    /// Yellow → orange → red, used for the choropleth.
    pub fn yl_or_rd() -> Self {
        Self::from_hex(&[0xffffcc, 0xfeb24c, 0xfd8d3c, 0xe31a1c, 0x800026])
    }

    /// Light pink → dark red, used for ranking bars.
    pub fn reds() -> Self {
        Self::from_hex(&[0xfee0d2, 0xfc9272, 0xde2d26, 0x67000d])
    }

    /// Colour at position `t` in `0..=1` (clamped).
    pub fn at(&self, t: f32) -> Color32 {
        let last = self.stops.len().saturating_sub(1);
        if last == 0 {
            return self.stops.first().map_or(NO_DATA, |c| to_color32(Srgb::from_linear(*c)));
        }
        let scaled = t.clamp(0.0, 1.0) * last as f32;
        let idx = (scaled.floor() as usize).min(last - 1);
        let frac = scaled - idx as f32;
        let (a, b) = (self.stops[idx], self.stops[idx + 1]);
        let mixed = LinSrgb::new(
            a.red + (b.red - a.red) * frac,
            a.green + (b.green - a.green) * frac,
            a.blue + (b.blue - a.blue) * frac,
        );
        to_color32(Srgb::from_linear(mixed))
    }

    /// Colour for `value` relative to `max`.
    pub fn for_value(&self, value: usize, max: usize) -> Color32 {
        if max == 0 {
            return self.at(0.0);
        }
        self.at(value as f32 / max as f32)
    }
}

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

pub fn risk_color(category: RiskCategory) -> Color32 {
    match category {
        RiskCategory::High => Color32::from_rgb(0xFF, 0x52, 0x52),
        RiskCategory::Medium => Color32::from_rgb(0xFF, 0xC1, 0x07),
        RiskCategory::Low => Color32::from_rgb(0x66, 0xBB, 0x6A),
    }
}

/// Weekly bars.
pub const WEEKLY_BARS: Color32 = Color32::from_rgb(255, 82, 82);
/// Moving-average line.
pub const TREND_LINE: Color32 = Color32::from_rgb(144, 202, 249);

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints_match_stops() {
        let scale = ColorScale::yl_or_rd();
        assert_eq!(scale.at(0.0), Color32::from_rgb(0xff, 0xff, 0xcc));
        assert_eq!(scale.at(1.0), Color32::from_rgb(0x80, 0x00, 0x26));
        assert_eq!(scale.at(7.0), scale.at(1.0));
    }

    #[test]
    fn zero_max_uses_lowest_colour() {
        let scale = ColorScale::reds();
        assert_eq!(scale.for_value(0, 0), scale.at(0.0));
    }

    #[test]
    fn palette_has_requested_size() {
        assert!(warm_palette(0).is_empty());
        assert_eq!(warm_palette(3).len(), 3);
    }
}
