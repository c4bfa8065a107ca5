use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use rhyme_viewer::data::Channel;

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

// ---------------------------------------------------------------------------
// Color mapping: channel → Color32
// ---------------------------------------------------------------------------

/// A fixed colour per signal channel, so a feature keeps its colour when the
/// selection changes.
#[derive(Debug, Clone)]
pub struct ChannelPalette {
    mapping: BTreeMap<Channel, Color32>,
    default_color: Color32,
}

impl Default for ChannelPalette {
    fn default() -> Self {
        let mapping = Channel::ALL
            .into_iter()
            .zip(generate_palette(Channel::ALL.len()))
            .collect();
        ChannelPalette {
            mapping,
            default_color: Color32::GRAY,
        }
    }
}

impl ChannelPalette {
    pub fn color_for(&self, channel: Channel) -> Color32 {
        self.mapping
            .get(&channel)
            .copied()
            .unwrap_or(self.default_color)
    }
}
