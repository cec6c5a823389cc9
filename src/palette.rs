// Named colors, grayscale ramps and marker cycles

use crate::error::{ChartError, Result};
use crate::ir::Marker;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(255, 0, 0);

    /// HLS lightness in [0, 1]
    pub fn lightness(&self) -> f64 {
        let max = self.r.max(self.g).max(self.b) as f64;
        let min = self.r.min(self.g).min(self.b) as f64;
        (max + min) / 2.0 / 255.0
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("white", Color::rgb(255, 255, 255)),
    ("black", Color::rgb(0, 0, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("darkgray", Color::rgb(169, 169, 169)),
    ("lightgray", Color::rgb(211, 211, 211)),
    ("dimgray", Color::rgb(105, 105, 105)),
    ("silver", Color::rgb(192, 192, 192)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("orange", Color::rgb(255, 165, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("brown", Color::rgb(165, 42, 42)),
    ("pink", Color::rgb(255, 192, 203)),
    ("olive", Color::rgb(128, 128, 0)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
];

/// Resolve a color name ("darkgrey", "k") or a "#rrggbb" hex string.
pub fn parse_color(name: &str) -> Result<Color> {
    let lower = name.trim().to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ChartError::Validation(format!("Invalid hex color '{}'", name)));
    }
    let canonical = match lower.as_str() {
        "k" => "black",
        "w" => "white",
        "r" => "red",
        "g" => "green",
        "b" => "blue",
        other => other,
    };
    // grey and gray spellings are interchangeable
    let canonical = canonical.replace("grey", "gray");
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == canonical)
        .map(|(_, c)| *c)
        .ok_or_else(|| ChartError::Validation(format!("Unknown color '{}'", name)))
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Sequential white-to-black color map; `t` is clamped to [0, 1].
pub fn greys(t: f64) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let v = (255.0 * (1.0 - t)).round() as u8;
    Color::rgb(v, v, v)
}

/// `n` distinct grays sampled from the Greys ramp at i/n.
pub fn grayscale_palette(n: usize) -> Vec<Color> {
    (0..n).map(|i| greys(i as f64 / n as f64)).collect()
}

/// Black text on light backgrounds, white text on dark ones.
pub fn contrast_color(background: Color) -> Color {
    if background.lightness() > 0.5 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

/// Cycling list of colors, one per drawn item
pub struct ColorPalette {
    colors: Vec<Color>,
}

impl ColorPalette {
    pub fn new(colors: Vec<Color>) -> Self {
        ColorPalette { colors }
    }

    pub fn from_names(names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Err(ChartError::Validation("color cycle must not be empty".into()));
        }
        let colors = names.iter().map(|n| parse_color(n)).collect::<Result<Vec<_>>>()?;
        Ok(ColorPalette { colors })
    }

    /// Gantt bar fill cycle
    pub fn gantt() -> Self {
        ColorPalette::new(vec![
            Color::rgb(211, 211, 211),
            Color::rgb(169, 169, 169),
            Color::rgb(169, 169, 169),
            Color::BLACK,
        ])
    }

    /// Value wedge and remainder wedge of a share pie
    pub fn pie() -> Self {
        ColorPalette::new(vec![Color::rgb(169, 169, 169), Color::rgb(211, 211, 211)])
    }

    pub fn get_color(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }
}

pub const MARKER_CYCLE: [Marker; 8] = [
    Marker::Circle,
    Marker::TriangleUp,
    Marker::Square,
    Marker::Star,
    Marker::Plus,
    Marker::Cross,
    Marker::Diamond,
    Marker::Hexagon,
];

/// Assign markers to keys in the given order, cycling when there are more keys than markers
pub fn assign_markers(keys: &[String]) -> HashMap<String, Marker> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| (key.clone(), MARKER_CYCLE[i % MARKER_CYCLE.len()]))
        .collect()
}
