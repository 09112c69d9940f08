use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Marker colour used when no colour encoding is active.
pub const DEFAULT_MARKER: Color32 = Color32::from_rgb(0x63, 0x6e, 0xfa);

/// Marker colour of the plain point map.
pub const NATIVE_MARKER: Color32 = Color32::from_rgb(0xff, 0x4b, 0x4b);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            to_color32(hsl.into_color())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of a categorical column (e.g. UF codes) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the labels, in sorted order so colours stay
    /// stable while filters change.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: std::collections::BTreeSet<&str> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(l, c)| (l.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Density ramp
// ---------------------------------------------------------------------------

/// Colour for a normalised density in `[0, 1]`: dark purple through orange to
/// pale yellow, with alpha rising so sparse cells let the base map through.
pub fn heat_color(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    let stops = [
        Srgb::new(0.05_f32, 0.03, 0.53),
        Srgb::new(0.80, 0.28, 0.47),
        Srgb::new(0.94, 0.98, 0.13),
    ];
    let lerp = |a: Srgb, b: Srgb, f: f32| {
        Srgb::new(
            a.red + (b.red - a.red) * f,
            a.green + (b.green - a.green) * f,
            a.blue + (b.blue - a.blue) * f,
        )
    };
    let rgb = if t < 0.5 {
        lerp(stops[0], stops[1], t * 2.0)
    } else {
        lerp(stops[1], stops[2], (t - 0.5) * 2.0)
    };
    let c = to_color32(rgb);
    let alpha = (60.0 + 180.0 * t) as u8;
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colors_are_distinct() {
        let p = generate_palette(27);
        assert_eq!(p.len(), 27);
        let unique: std::collections::HashSet<_> = p.iter().collect();
        assert_eq!(unique.len(), 27);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn color_map_is_order_independent() {
        let a = ColorMap::new(["SP", "AM", "BA"]);
        let b = ColorMap::new(["BA", "SP", "AM", "SP"]);
        for uf in ["SP", "AM", "BA"] {
            assert_eq!(a.color_for(uf), b.color_for(uf));
        }
        assert_eq!(a.color_for("RJ"), Color32::GRAY);
    }

    #[test]
    fn heat_ramp_gets_more_opaque() {
        assert!(heat_color(0.0).a() < heat_color(1.0).a());
        assert_eq!(heat_color(2.0), heat_color(1.0));
    }
}
