// Layered chart options: function defaults <- figure <- plot <- overrides

use crate::error::{ChartError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_FIGSIZE: (f64, f64) = (6.0, 4.0);
pub const DEFAULT_DPI: f64 = 100.0;

/// A bag of optional chart settings. Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Figure size in inches
    pub figsize: Option<(f64, f64)>,
    pub dpi: Option<f64>,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub color: Option<String>,
    pub edgecolor: Option<String>,
    /// Cycle of fill colors for charts that alternate colors per item
    pub colors: Option<Vec<String>>,
    pub line_width: Option<f64>,
    pub marker: Option<String>,
    pub marker_size: Option<f64>,
    pub alpha: Option<f64>,
    /// Bar width (bar chart) or bar height (gantt) in data units
    pub bar_width: Option<f64>,
    pub legend: Option<bool>,
    pub grid: Option<bool>,
    pub font_size: Option<u32>,
    pub date_format: Option<String>,
    /// Draw the date axis with plain numbers instead of formatted dates
    pub suppress_date_format: Option<bool>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub ticks_on_top: Option<bool>,
    pub colorbar: Option<bool>,
    pub tick_labels: Option<Vec<String>>,
    pub now_label: Option<String>,
}

impl Settings {
    /// Merge `upper` on top of `self`, field by field.
    pub fn layer(self, upper: &Settings) -> Settings {
        let upper = upper.clone();
        Settings {
            figsize: upper.figsize.or(self.figsize),
            dpi: upper.dpi.or(self.dpi),
            title: upper.title.or(self.title),
            xlabel: upper.xlabel.or(self.xlabel),
            ylabel: upper.ylabel.or(self.ylabel),
            color: upper.color.or(self.color),
            edgecolor: upper.edgecolor.or(self.edgecolor),
            colors: upper.colors.or(self.colors),
            line_width: upper.line_width.or(self.line_width),
            marker: upper.marker.or(self.marker),
            marker_size: upper.marker_size.or(self.marker_size),
            alpha: upper.alpha.or(self.alpha),
            bar_width: upper.bar_width.or(self.bar_width),
            legend: upper.legend.or(self.legend),
            grid: upper.grid.or(self.grid),
            font_size: upper.font_size.or(self.font_size),
            date_format: upper.date_format.or(self.date_format),
            suppress_date_format: upper.suppress_date_format.or(self.suppress_date_format),
            xlim: upper.xlim.or(self.xlim),
            ylim: upper.ylim.or(self.ylim),
            ticks_on_top: upper.ticks_on_top.or(self.ticks_on_top),
            colorbar: upper.colorbar.or(self.colorbar),
            tick_labels: upper.tick_labels.or(self.tick_labels),
            now_label: upper.now_label.or(self.now_label),
        }
    }

    pub fn figsize(&self) -> (f64, f64) {
        self.figsize.unwrap_or(DEFAULT_FIGSIZE)
    }

    /// Figure size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w, h) = self.figsize();
        let dpi = self.dpi.unwrap_or(DEFAULT_DPI);
        ((w * dpi).round().max(1.0) as u32, (h * dpi).round().max(1.0) as u32)
    }

    pub fn title_or(&self, fallback: &str) -> String {
        self.title.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn xlabel_or(&self, fallback: &str) -> String {
        self.xlabel.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn ylabel_or(&self, fallback: &str) -> String {
        self.ylabel.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn color_or(&self, fallback: &str) -> String {
        self.color.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn edgecolor_or(&self, fallback: &str) -> String {
        self.edgecolor.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn legend_or(&self, fallback: bool) -> bool {
        self.legend.unwrap_or(fallback)
    }

    pub fn grid_or(&self, fallback: bool) -> bool {
        self.grid.unwrap_or(fallback)
    }
}

/// Caller options for a single chart call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartOptions {
    #[serde(default)]
    pub figure: Settings,
    #[serde(default)]
    pub plot: Settings,
    #[serde(default)]
    pub overrides: Settings,
}

impl ChartOptions {
    /// Effective settings for a chart whose own defaults are `defaults`.
    pub fn resolve(&self, defaults: Settings) -> Settings {
        defaults
            .layer(&self.figure)
            .layer(&self.plot)
            .layer(&self.overrides)
    }

    pub fn with_overrides(mut self, overrides: Settings) -> Self {
        self.overrides = self.overrides.layer(&overrides);
        self
    }
}

pub fn parse_options(content: &str) -> Result<ChartOptions> {
    toml::from_str(content).map_err(|e| ChartError::Config(e.to_string()))
}

/// Load chart options from a TOML file with `[figure]`, `[plot]` and `[overrides]` tables.
pub fn load_options(path: &Path) -> Result<ChartOptions> {
    let content = fs::read_to_string(path)?;
    parse_options(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_upper_wins_field_by_field() {
        let defaults = Settings {
            title: Some("Bar Chart".into()),
            color: Some("gray".into()),
            ..Default::default()
        };
        let upper = Settings {
            title: Some("Sales".into()),
            ..Default::default()
        };
        let merged = defaults.layer(&upper);
        assert_eq!(merged.title.as_deref(), Some("Sales"));
        assert_eq!(merged.color.as_deref(), Some("gray"));
    }

    #[test]
    fn test_resolve_order() {
        let options = ChartOptions {
            figure: Settings {
                figsize: Some((8.0, 3.0)),
                title: Some("from figure".into()),
                ..Default::default()
            },
            plot: Settings {
                title: Some("from plot".into()),
                color: Some("black".into()),
                ..Default::default()
            },
            overrides: Settings {
                title: Some("from overrides".into()),
                ..Default::default()
            },
        };
        let s = options.resolve(Settings {
            title: Some("default".into()),
            color: Some("gray".into()),
            edgecolor: Some("black".into()),
            ..Default::default()
        });
        assert_eq!(s.title.as_deref(), Some("from overrides"));
        assert_eq!(s.color.as_deref(), Some("black"));
        assert_eq!(s.edgecolor.as_deref(), Some("black"));
        assert_eq!(s.figsize(), (8.0, 3.0));
    }

    #[test]
    fn test_resolve_leaves_options_untouched() {
        let options = ChartOptions::default();
        let first = options.resolve(Settings {
            title: Some("A".into()),
            ..Default::default()
        });
        let second = options.resolve(Settings::default());
        assert_eq!(first.title.as_deref(), Some("A"));
        assert_eq!(second.title, None);
        assert_eq!(options, ChartOptions::default());
    }

    #[test]
    fn test_pixel_size() {
        assert_eq!(Settings::default().pixel_size(), (600, 400));
        let s = Settings {
            figsize: Some((3.0, 2.0)),
            dpi: Some(50.0),
            ..Default::default()
        };
        assert_eq!(s.pixel_size(), (150, 100));
    }

    #[test]
    fn test_parse_options_toml() {
        let options = parse_options(
            r#"
[figure]
figsize = [8.0, 5.0]

[plot]
color = "black"
line_width = 3.0

[overrides]
title = "Clinic visits"
legend = false
"#,
        )
        .unwrap();
        assert_eq!(options.figure.figsize, Some((8.0, 5.0)));
        assert_eq!(options.plot.color.as_deref(), Some("black"));
        assert_eq!(options.overrides.legend, Some(false));
    }

    #[test]
    fn test_parse_options_rejects_unknown_keys() {
        let err = parse_options("[plot]\ncolour = \"red\"\n").unwrap_err();
        assert!(matches!(err, ChartError::Config(_)));
    }

    #[test]
    fn test_with_overrides_stacks() {
        let options = ChartOptions::default()
            .with_overrides(Settings {
                title: Some("T".into()),
                ..Default::default()
            })
            .with_overrides(Settings {
                xlabel: Some("X".into()),
                ..Default::default()
            });
        assert_eq!(options.overrides.title.as_deref(), Some("T"));
        assert_eq!(options.overrides.xlabel.as_deref(), Some("X"));
    }
}
