use super::timeline::{grouped_chart, TimeChartKind, TimeSeries};
use super::{format_number, require_data, unique_in_order, unique_sorted};
use crate::error::{ensure_same_len, ChartError, Result};
use crate::ir::{Anchor, Colorbar, DrawCommand, Figure, Panel, ShapeStyle, Ticks};
use crate::layout::value_counts;
use crate::options::{ChartOptions, Settings};
use crate::palette::{contrast_color, greys, Color};
use crate::table::{ColumnSelector, Table};
use chrono::{Datelike, NaiveDateTime};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapMode {
    /// Count matrix of categories against distinct values
    Values,
    /// Shaded interval bands per category
    Intervals,
}

impl FromStr for HeatmapMode {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heatmap" => Ok(HeatmapMode::Values),
            "gantt" => Ok(HeatmapMode::Intervals),
            other => Err(ChartError::UnknownMode {
                given: other.to_string(),
                expected: "'heatmap' or 'gantt'",
            }),
        }
    }
}

/// Heatmap in either mode. `values` entries may hold several values each;
/// interval mode needs both date sequences.
pub fn heatmap(
    categories: &[String],
    values: Option<&[Vec<f64>]>,
    starts: Option<&[NaiveDateTime]>,
    ends: Option<&[NaiveDateTime]>,
    mode: HeatmapMode,
    options: &ChartOptions,
) -> Result<Figure> {
    match mode {
        HeatmapMode::Intervals => {
            let (Some(starts), Some(ends)) = (starts, ends) else {
                return Err(ChartError::Validation(
                    "Start and end dates must be provided for 'gantt' mode".into(),
                ));
            };
            let scalars = values
                .map(|v| {
                    v.iter()
                        .enumerate()
                        .map(|(i, cell)| {
                            cell.first().copied().ok_or_else(|| {
                                ChartError::Validation(format!("Value for record {} is empty", i))
                            })
                        })
                        .collect::<Result<Vec<f64>>>()
                })
                .transpose()?;
            let mut series = TimeSeries::new(categories, starts, ends);
            if let Some(scalars) = scalars.as_deref() {
                series = series.with_values(scalars);
            }
            grouped_chart(&series, TimeChartKind::Heatmap, None, options)
        }
        HeatmapMode::Values => {
            let values = values.ok_or_else(|| {
                ChartError::Validation("Values must be provided for 'heatmap' mode".into())
            })?;
            value_heatmap(categories, values, options)
        }
    }
}

fn value_defaults(n_categories: usize) -> Settings {
    Settings {
        figsize: Some((5.0, n_categories.max(1) as f64)),
        title: Some("Heatmap".into()),
        xlabel: Some("Values".into()),
        ylabel: Some("Categories".into()),
        ticks_on_top: Some(false),
        colorbar: Some(false),
        ..Default::default()
    }
}

fn value_heatmap(categories: &[String], values: &[Vec<f64>], options: &ChartOptions) -> Result<Figure> {
    ensure_same_len(&[("categories", categories.len()), ("values", values.len())])?;
    require_data(categories.len(), "heatmap")?;

    let rows = unique_sorted(categories);
    let flat: Vec<f64> = values.iter().flatten().copied().collect();
    let columns: Vec<f64> = value_counts(&flat).into_iter().map(|(v, _)| v).collect();

    let mut matrix = vec![vec![0usize; columns.len()]; rows.len()];
    for (category, cell) in categories.iter().zip(values) {
        let i = rows.iter().position(|r| r == category).unwrap_or(0);
        for v in cell {
            if let Some(j) = columns.iter().position(|c| c == v) {
                matrix[i][j] += 1;
            }
        }
    }
    let max = matrix.iter().flatten().copied().max().unwrap_or(0);

    let settings = options.resolve(value_defaults(rows.len()));
    let n_rows = rows.len();
    let mut panel = Panel::new(
        0,
        0,
        (-0.5, columns.len() as f64 - 0.5),
        (-0.5, n_rows as f64 - 0.5),
    );
    for (i, counts) in matrix.iter().enumerate() {
        // first category on top
        let y = (n_rows - 1 - i) as f64;
        for (j, count) in counts.iter().enumerate() {
            let t = if max == 0 { 0.0 } else { *count as f64 / max as f64 };
            panel.push(DrawCommand::Rect {
                from: (j as f64 - 0.5, y - 0.5),
                to: (j as f64 + 0.5, y + 0.5),
                style: ShapeStyle::filled(greys(t)),
                legend: None,
            });
        }
    }

    panel.x_axis.ticks = Ticks::Fixed(
        columns
            .iter()
            .enumerate()
            .map(|(j, v)| (j as f64, format_number(*v)))
            .collect(),
    );
    panel.y_axis.ticks = Ticks::Fixed(
        rows.iter()
            .enumerate()
            .map(|(i, r)| ((n_rows - 1 - i) as f64, r.clone()))
            .collect(),
    );
    panel.x_axis.label = settings.xlabel.clone();
    panel.y_axis.label = settings.ylabel.clone();
    panel.x_axis.opposite = settings.ticks_on_top.unwrap_or(false);
    if settings.colorbar.unwrap_or(false) {
        panel.colorbar = Some(Colorbar {
            label: String::new(),
            min: 0.0,
            max: max as f64,
        });
    }

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}

fn yearly_defaults() -> Settings {
    Settings {
        figsize: Some((12.0, 6.0)),
        title: Some("Heatmap".into()),
        font_size: Some(11),
        ..Default::default()
    }
}

/// Row counts per (category, year) over every year between the first and last.
pub fn yearly_heatmap(table: &Table, date_column: &str, y_column: &str, options: &ChartOptions) -> Result<Figure> {
    let dates = table
        .column(&ColumnSelector::Name(date_column.to_string()))?
        .to_datetimes()?;
    let categories = table
        .column(&ColumnSelector::Name(y_column.to_string()))?
        .to_strings();
    require_data(dates.len(), "heatmap")?;

    let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
    let (min_year, max_year) = (
        years.iter().copied().min().unwrap_or(0),
        years.iter().copied().max().unwrap_or(0),
    );
    let year_bins: Vec<i32> = (min_year..=max_year).collect();
    let rows = unique_in_order(&categories);

    let mut counts: HashMap<(usize, i32), usize> = HashMap::new();
    for (category, year) in categories.iter().zip(&years) {
        let i = rows.iter().position(|r| r == category).unwrap_or(0);
        *counts.entry((i, *year)).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);

    let settings = options.resolve(yearly_defaults());
    let font_size = settings.font_size.unwrap_or(11);
    let mut panel = Panel::new(0, 0, (0.0, year_bins.len() as f64), (0.0, rows.len() as f64));

    for (i, _) in rows.iter().enumerate() {
        for (j, year) in year_bins.iter().enumerate() {
            let count = counts.get(&(i, *year)).copied().unwrap_or(0);
            let fill = greys(if max == 0 { 0.0 } else { count as f64 / max as f64 });
            let (x, y) = (j as f64, i as f64);
            panel.push(DrawCommand::Rect {
                from: (x, y),
                to: (x + 1.0, y + 1.0),
                style: ShapeStyle::filled(fill).with_edge(Color::BLACK),
                legend: None,
            });
            if count > 0 {
                panel.push(DrawCommand::Text {
                    position: (x + 0.5, y + 0.5),
                    text: count.to_string(),
                    color: contrast_color(fill),
                    size: font_size,
                    anchor: Anchor::Center,
                });
            }
        }
    }

    panel.x_axis.ticks = Ticks::Fixed(
        year_bins
            .iter()
            .enumerate()
            .map(|(j, y)| (j as f64 + 0.5, y.to_string()))
            .collect(),
    );
    panel.y_axis.ticks = Ticks::Fixed(
        rows.iter()
            .enumerate()
            .map(|(i, r)| (i as f64 + 0.5, r.clone()))
            .collect(),
    );
    panel.x_axis.label = settings.xlabel.clone();
    panel.y_axis.label = settings.ylabel.clone();
    panel.colorbar = Some(Colorbar {
        label: "Event Count".into(),
        min: 0.0,
        max: max as f64,
    });

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
