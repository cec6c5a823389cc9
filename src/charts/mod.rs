// Chart builders. Each one validates its inputs, merges options over its own
// defaults and compiles the data into a scene graph `Figure`.

pub mod bar;
pub mod box_plot;
pub mod calendar;
pub mod dot;
pub mod gantt;
pub mod grid;
pub mod heatmap;
pub mod histogram;
pub mod pie;
pub mod radar;
pub mod scatter;
pub mod table_list;
pub mod timeline;
pub mod violin;

use crate::error::{ChartError, Result};
use crate::ir::Ticks;
use crate::options::{Settings, DEFAULT_DPI};
use crate::palette::{parse_color, Color};
use std::collections::HashSet;
use std::str::FromStr;

pub use bar::bar;
pub use box_plot::box_plot;
pub use calendar::{calendar, calendar_layout, CalendarLayout};
pub use dot::dot;
pub use gantt::gantt;
pub use grid::plot_grid;
pub use heatmap::{heatmap, yearly_heatmap, HeatmapMode};
pub use histogram::histogram;
pub use pie::{pie, pie_counts, pie_intervals};
pub use radar::radar;
pub use scatter::{scatter, ScatterData};
pub use table_list::table_list;
pub use timeline::{grouped_chart, line, with_now_line, TimeChartKind, TimeSeries};
pub use violin::violin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn is_horizontal(self) -> bool {
        self == Orientation::Horizontal
    }
}

impl FromStr for Orientation {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" => Ok(Orientation::Vertical),
            "horizontal" => Ok(Orientation::Horizontal),
            other => Err(ChartError::UnknownMode {
                given: other.to_string(),
                expected: "'vertical' or 'horizontal'",
            }),
        }
    }
}

// helpers shared by the builders

/// Distinct labels in order of first appearance
pub(crate) fn unique_in_order(labels: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .filter(|l| seen.insert(l.as_str()))
        .cloned()
        .collect()
}

pub(crate) fn unique_sorted(labels: &[String]) -> Vec<String> {
    let mut unique = unique_in_order(labels);
    unique.sort();
    unique
}

/// Tick labels at integer positions starting at `first`
pub(crate) fn category_ticks(labels: &[String], first: f64) -> Ticks {
    Ticks::Fixed(
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| (first + i as f64, l.clone()))
            .collect(),
    )
}

pub(crate) fn color_setting(name: &Option<String>, fallback: Color) -> Result<Color> {
    match name {
        Some(n) => parse_color(n),
        None => Ok(fallback),
    }
}

/// Marker size in points converted to pixels at the figure's dpi
pub(crate) fn points_to_px(points: f64, settings: &Settings) -> f64 {
    points * settings.dpi.unwrap_or(DEFAULT_DPI) / 72.0
}

/// Integral values print without a fractional part
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Min-max normalise into [0, 1]; a constant series maps to 0.5.
pub(crate) fn normalize(values: &[f64]) -> Vec<f64> {
    let (lo, hi) = crate::layout::min_max(values);
    values
        .iter()
        .map(|v| if hi > lo { (v - lo) / (hi - lo) } else { 0.5 })
        .collect()
}

pub(crate) fn require_data(len: usize, what: &'static str) -> Result<()> {
    if len == 0 {
        return Err(ChartError::EmptyData(what));
    }
    Ok(())
}
