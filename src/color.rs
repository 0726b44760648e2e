use std::collections::BTreeMap;

use anomaly_detector::constants::export::HIGHLIGHT_RGB;
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// The abnormal-row fill used by the exported workbook, for on-screen rows.
pub fn highlight_color() -> Color32 {
    let [_, r, g, b] = HIGHLIGHT_RGB.to_be_bytes();
    Color32::from_rgb(r, g, b)
}

// ---------------------------------------------------------------------------
// Color mapping: measurement name → Color32
// ---------------------------------------------------------------------------

/// Maps measurement names to distinct colours for the breakdown chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map over the given (already distinct) names.
    pub fn new(names: &[String]) -> Self {
        let palette = generate_palette(names.len());
        let mapping = names.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given measurement name.
    pub fn color_for(&self, name: &str) -> Color32 {
        self.mapping
            .get(name)
            .copied()
            .unwrap_or(self.default_color)
    }
}
