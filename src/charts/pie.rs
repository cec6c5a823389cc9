use super::{format_number, require_data, unique_sorted};
use crate::error::{ensure_same_len, ChartError, Result};
use crate::ir::{Anchor, Axis, DrawCommand, Figure, Panel, ShapeStyle};
use crate::layout::{date_to_num, interval_wedge, min_max, share_wedges, wedge_polygon};
use crate::options::{ChartOptions, Settings};
use crate::palette::{Color, ColorPalette};
use chrono::NaiveDateTime;

const RADIUS: f64 = 1.0;
const LABEL_DISTANCE: f64 = 1.1;
const EXTENT: (f64, f64) = (-1.25, 1.25);

fn defaults(n: usize) -> Settings {
    Settings {
        figsize: Some((3.0 * n.max(1) as f64, 3.0)),
        edgecolor: Some("black".into()),
        ..Default::default()
    }
}

fn pie_panel(col: usize, title: &str, wedges: [(f64, f64); 2], label: Option<String>, edge: Color) -> Panel {
    let palette = ColorPalette::pie();
    let mut panel = Panel::new(0, col, EXTENT, EXTENT);
    panel.x_axis = Axis::hidden(EXTENT);
    panel.y_axis = Axis::hidden(EXTENT);
    panel.title = Some(title.to_string());

    for (i, (from, to)) in wedges.iter().enumerate() {
        if (to - from).abs() < f64::EPSILON {
            continue;
        }
        panel.push(DrawCommand::Polygon {
            points: wedge_polygon((0.0, 0.0), RADIUS, *from, *to),
            style: ShapeStyle::filled(palette.get_color(i)).with_edge(edge),
            legend: None,
        });
    }

    if let Some(text) = label {
        let (from, to) = wedges[0];
        let mid = ((from + to) / 2.0).to_radians();
        panel.push(DrawCommand::Text {
            position: (LABEL_DISTANCE * mid.cos(), LABEL_DISTANCE * mid.sin()),
            text,
            color: Color::BLACK,
            size: 10,
            anchor: Anchor::Center,
        });
    }
    panel
}

fn assemble(panels: Vec<Panel>, settings: &Settings) -> Figure {
    let mut figure = Figure::new(settings, 1, panels.len());
    figure.panels = panels;
    figure.title = settings.title.clone();
    figure
}

/// One pie per category showing that category's share of the total.
pub fn pie(categories: &[String], values: &[f64], options: &ChartOptions) -> Result<Figure> {
    ensure_same_len(&[("categories", categories.len()), ("values", values.len())])?;
    require_data(categories.len(), "pie chart")?;
    if let Some(bad) = values.iter().find(|v| **v < 0.0 || !v.is_finite()) {
        return Err(ChartError::Validation(format!(
            "Pie values must be finite and non-negative (got {})",
            bad
        )));
    }

    let settings = options.resolve(defaults(categories.len()));
    let edge = crate::palette::parse_color(&settings.edgecolor_or("black"))?;
    let total: f64 = values.iter().sum();
    let panels = categories
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (category, value))| {
            pie_panel(i, category, share_wedges(*value, total), Some(format_number(*value)), edge)
        })
        .collect();
    Ok(assemble(panels, &settings))
}

/// Pie per distinct category, sized by how often it occurs.
pub fn pie_counts(categories: &[String], options: &ChartOptions) -> Result<Figure> {
    require_data(categories.len(), "pie chart")?;
    let distinct = unique_sorted(categories);
    let counts: Vec<f64> = distinct
        .iter()
        .map(|d| categories.iter().filter(|c| *c == d).count() as f64)
        .collect();
    pie(&distinct, &counts, options)
}

/// One pie per record; the dark wedge covers the record's interval as a share
/// of the whole time span, running clockwise from 12 o'clock.
pub fn pie_intervals(
    categories: &[String],
    starts: &[NaiveDateTime],
    ends: &[NaiveDateTime],
    options: &ChartOptions,
) -> Result<Figure> {
    ensure_same_len(&[
        ("categories", categories.len()),
        ("start_dates", starts.len()),
        ("end_dates", ends.len()),
    ])?;
    require_data(categories.len(), "pie chart")?;

    let settings = options.resolve(defaults(categories.len()));
    let edge = crate::palette::parse_color(&settings.edgecolor_or("black"))?;
    let start_nums: Vec<f64> = starts.iter().map(date_to_num).collect();
    let end_nums: Vec<f64> = ends.iter().map(date_to_num).collect();
    let (span_min, _) = min_max(&start_nums);
    let (_, span_max) = min_max(&end_nums);

    let panels = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let (from, to) = interval_wedge(start_nums[i], end_nums[i], span_min, span_max);
            let label = format!("{} - {}", starts[i].format("%Y"), ends[i].format("%Y"));
            pie_panel(i, category, [(from, to), (to, from + 360.0)], Some(label), edge)
        })
        .collect();
    Ok(assemble(panels, &settings))
}
