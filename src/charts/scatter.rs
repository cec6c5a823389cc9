use super::timeline::{grouped_chart, TimeChartKind, TimeSeries};
use super::{category_ticks, color_setting, points_to_px, require_data, unique_in_order};
use crate::error::{ensure_same_len, Result};
use crate::ir::{DrawCommand, Figure, Marker, MarkerStyle, Panel};
use crate::layout::{min_max, padded_range};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;
use std::collections::HashMap;

pub enum ScatterData<'a> {
    /// One point per (category, value) pair
    Values {
        categories: &'a [String],
        values: &'a [f64],
    },
    /// Interval end points per category row
    Intervals(TimeSeries<'a>),
}

fn defaults() -> Settings {
    Settings {
        title: Some("Scatter Plot".into()),
        xlabel: Some("Categories".into()),
        ylabel: Some("Values".into()),
        color: Some("black".into()),
        marker: Some("o".into()),
        marker_size: Some(6.0),
        ..Default::default()
    }
}

pub fn scatter(
    data: &ScatterData,
    markers: Option<&HashMap<String, Marker>>,
    options: &ChartOptions,
) -> Result<Figure> {
    match data {
        ScatterData::Intervals(series) => grouped_chart(series, TimeChartKind::Scatter, markers, options),
        ScatterData::Values { categories, values } => value_scatter(categories, values, markers, options),
    }
}

fn value_scatter(
    categories: &[String],
    values: &[f64],
    markers: Option<&HashMap<String, Marker>>,
    options: &ChartOptions,
) -> Result<Figure> {
    ensure_same_len(&[("categories", categories.len()), ("values", values.len())])?;
    require_data(values.len(), "scatter plot")?;

    let settings = options.resolve(defaults());
    let default_marker = settings.marker.as_deref().unwrap_or("o").parse::<Marker>()?;
    let fill = color_setting(&settings.color, Color::BLACK)?;
    let size = points_to_px(settings.marker_size.unwrap_or(6.0), &settings);

    let slots = unique_in_order(categories);
    let (lo, hi) = min_max(values);
    let y_range = settings.ylim.unwrap_or_else(|| padded_range(lo, hi, 0.05));
    let mut panel = Panel::new(0, 0, (-0.5, slots.len() as f64 - 0.5), y_range);

    for (slot, category) in slots.iter().enumerate() {
        let points: Vec<(f64, f64)> = categories
            .iter()
            .zip(values)
            .filter(|(c, _)| *c == category)
            .map(|(_, v)| (slot as f64, *v))
            .collect();
        let marker = markers
            .and_then(|m| m.get(category).copied())
            .unwrap_or(default_marker);
        panel.push(DrawCommand::Markers {
            points,
            style: MarkerStyle {
                marker,
                size,
                fill,
                edge: None,
            },
            legend: None,
        });
    }

    panel.x_axis.ticks = category_ticks(&slots, 0.0);
    panel.x_axis.label = settings.xlabel.clone();
    panel.y_axis.label = settings.ylabel.clone();
    panel.y_axis.grid = settings.grid_or(false);

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
