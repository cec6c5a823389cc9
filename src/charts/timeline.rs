//! Grouped time charts: every record is an interval drawn on its category's row.

use super::{category_ticks, color_setting, normalize, points_to_px, require_data, unique_in_order, unique_sorted};
use crate::error::{ensure_same_len, ChartError, Result};
use crate::ir::{
    Anchor, DrawCommand, Figure, Legend, LineStyle, Marker, MarkerStyle, Panel, ShapeStyle, Ticks,
};
use crate::layout::{date_to_num, min_max, padded_range};
use crate::options::{ChartOptions, Settings};
use crate::palette::{assign_markers, greys, Color};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const ROW_HEIGHT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeChartKind {
    Line,
    Scatter,
    Heatmap,
}

impl TimeChartKind {
    pub fn title(self) -> &'static str {
        match self {
            TimeChartKind::Line => "Line Chart",
            TimeChartKind::Scatter => "Scatter Chart",
            TimeChartKind::Heatmap => "Heatmap Chart",
        }
    }
}

impl FromStr for TimeChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(TimeChartKind::Line),
            "scatter" => Ok(TimeChartKind::Scatter),
            "heatmap" => Ok(TimeChartKind::Heatmap),
            other => Err(ChartError::UnknownMode {
                given: other.to_string(),
                expected: "'line', 'scatter' or 'heatmap'",
            }),
        }
    }
}

impl fmt::Display for TimeChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeChartKind::Line => "line",
            TimeChartKind::Scatter => "scatter",
            TimeChartKind::Heatmap => "heatmap",
        };
        write!(f, "{}", name)
    }
}

/// Parallel interval records, optionally with one value per record.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeries<'a> {
    pub categories: &'a [String],
    pub starts: &'a [NaiveDateTime],
    pub ends: &'a [NaiveDateTime],
    pub values: Option<&'a [f64]>,
}

impl<'a> TimeSeries<'a> {
    pub fn new(categories: &'a [String], starts: &'a [NaiveDateTime], ends: &'a [NaiveDateTime]) -> Self {
        TimeSeries {
            categories,
            starts,
            ends,
            values: None,
        }
    }

    pub fn with_values(mut self, values: &'a [f64]) -> Self {
        self.values = Some(values);
        self
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let mut lengths = vec![
            ("categories", self.categories.len()),
            ("start_dates", self.starts.len()),
            ("end_dates", self.ends.len()),
        ];
        if let Some(values) = self.values {
            lengths.push(("values", values.len()));
        }
        ensure_same_len(&lengths)?;
        require_data(self.len(), "time chart")
    }

    /// Earliest start and latest end, in days since the epoch
    pub fn span(&self) -> (f64, f64) {
        let starts: Vec<f64> = self.starts.iter().map(date_to_num).collect();
        let ends: Vec<f64> = self.ends.iter().map(date_to_num).collect();
        (min_max(&starts).0, min_max(&ends).1)
    }
}

fn defaults(kind: TimeChartKind) -> Settings {
    Settings {
        title: Some(kind.title().into()),
        xlabel: Some("Time".into()),
        color: Some("black".into()),
        line_width: Some(2.0),
        marker_size: Some(6.0),
        legend: Some(true),
        date_format: Some("%Y".into()),
        ..Default::default()
    }
}

/// Compile one grouped time panel. Settings must already be resolved.
pub(crate) fn grouped_panel(
    series: &TimeSeries,
    kind: TimeChartKind,
    markers: Option<&HashMap<String, Marker>>,
    settings: &Settings,
    row: usize,
) -> Result<Panel> {
    series.validate()?;

    let rows = unique_in_order(series.categories);
    let category_markers = match markers {
        Some(m) => m.clone(),
        None => assign_markers(&unique_sorted(series.categories)),
    };
    let base_color = color_setting(&settings.color, Color::BLACK)?;
    let shades: Option<Vec<Color>> = series
        .values
        .map(|v| normalize(v).into_iter().map(|t| greys(0.3 + 0.7 * t)).collect());

    let (first, last) = series.span();
    let x_range = settings.xlim.unwrap_or_else(|| padded_range(first, last, 0.05));
    let y_range = (0.5, rows.len() as f64 + 0.5);
    let mut panel = Panel::new(row, 0, x_range, y_range);

    let marker_px = points_to_px(settings.marker_size.unwrap_or(6.0), settings);
    for (i, category) in series.categories.iter().enumerate() {
        let position = rows.iter().position(|r| r == category).unwrap_or(0) as f64 + 1.0;
        let start = date_to_num(&series.starts[i]);
        let end = date_to_num(&series.ends[i]);
        let color = shades.as_ref().map(|s| s[i]).unwrap_or(base_color);
        let marker = category_markers.get(category).copied().unwrap_or(Marker::Circle);
        let marker_style = MarkerStyle {
            marker,
            size: marker_px,
            fill: color,
            edge: shades.as_ref().map(|_| Color::BLACK),
        };

        match kind {
            TimeChartKind::Line => {
                panel.push(DrawCommand::Polyline {
                    points: vec![(start, position), (end, position)],
                    style: LineStyle::solid(base_color, settings.line_width.unwrap_or(2.0)),
                    legend: None,
                });
                panel.push(DrawCommand::Markers {
                    points: vec![(start, position), (end, position)],
                    style: marker_style,
                    legend: Some(category.clone()),
                });
            }
            TimeChartKind::Scatter => {
                panel.push(DrawCommand::Markers {
                    points: vec![(start, position), (end, position)],
                    style: marker_style,
                    legend: Some(category.clone()),
                });
            }
            TimeChartKind::Heatmap => {
                let fill = shades.as_ref().map(|s| s[i]).unwrap_or(Color::rgb(169, 169, 169));
                panel.push(DrawCommand::Rect {
                    from: (start, position - ROW_HEIGHT / 2.0),
                    to: (end, position + ROW_HEIGHT / 2.0),
                    style: ShapeStyle::filled(fill)
                        .with_edge(Color::BLACK)
                        .with_alpha(settings.alpha.unwrap_or(1.0)),
                    legend: None,
                });
            }
        }
    }

    panel.y_axis.ticks = category_ticks(&rows, 1.0);
    panel.y_axis.label = settings.ylabel.clone();
    panel.x_axis.label = settings.xlabel.clone();
    panel.x_axis.ticks = Ticks::Dates {
        format: settings.date_format.clone().unwrap_or_else(|| "%Y".into()),
    };
    panel.x_axis.grid = settings.grid_or(false);
    panel.title = settings.title.clone();
    if kind != TimeChartKind::Heatmap && settings.legend_or(true) {
        panel.legend = Some(Legend {
            title: Some("Categories".into()),
        });
    }
    Ok(panel)
}

/// Grouped interval chart: one row per category, drawn as lines, scatter points or shaded bands.
pub fn grouped_chart(
    series: &TimeSeries,
    kind: TimeChartKind,
    markers: Option<&HashMap<String, Marker>>,
    options: &ChartOptions,
) -> Result<Figure> {
    let settings = options.resolve(defaults(kind));
    let mut panel = grouped_panel(series, kind, markers, &settings, 0)?;
    panel.title = None;
    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}

pub fn line(series: &TimeSeries, markers: Option<&HashMap<String, Marker>>, options: &ChartOptions) -> Result<Figure> {
    grouped_chart(series, TimeChartKind::Line, markers, options)
}

/// Mark `now` on every panel with a red dashed vertical line and an optional label.
pub fn with_now_line(figure: &mut Figure, now: NaiveDateTime, label: Option<&str>) {
    let x = date_to_num(&now);
    for panel in &mut figure.panels {
        let (bottom, top) = panel.y_axis.range;
        panel.push(DrawCommand::Polyline {
            points: vec![(x, bottom), (x, top)],
            style: LineStyle {
                color: Color::RED,
                width: 1.0,
                dashed: true,
            },
            legend: None,
        });
        if let Some(text) = label {
            panel.push(DrawCommand::Text {
                position: (x, top),
                text: text.to_string(),
                color: Color::RED,
                size: 10,
                anchor: Anchor::Left,
            });
        }
    }
}
