use super::{category_ticks, color_setting, require_data, unique_in_order};
use crate::error::{ensure_same_len, Result};
use crate::ir::{DrawCommand, Figure, Panel, ShapeStyle, Ticks};
use crate::layout::{date_to_num, min_max, padded_range};
use crate::options::{ChartOptions, Settings};
use crate::palette::{Color, ColorPalette};
use chrono::NaiveDateTime;

fn defaults() -> Settings {
    Settings {
        title: Some("Gantt Chart".into()),
        xlabel: Some("Time".into()),
        edgecolor: Some("black".into()),
        bar_width: Some(0.4),
        grid: Some(true),
        date_format: Some("%Y".into()),
        ..Default::default()
    }
}

/// Horizontal bar per task spanning its start and end.
pub fn gantt(
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
    require_data(categories.len(), "gantt chart")?;

    let settings = options.resolve(defaults());
    let palette = match &settings.colors {
        Some(names) => ColorPalette::from_names(names)?,
        None => ColorPalette::gantt(),
    };
    let edge = color_setting(&settings.edgecolor, Color::BLACK)?;
    let height = settings.bar_width.unwrap_or(0.4);

    let start_nums: Vec<f64> = starts.iter().map(date_to_num).collect();
    let end_nums: Vec<f64> = ends.iter().map(date_to_num).collect();
    let (first, _) = min_max(&start_nums);
    let (_, last) = min_max(&end_nums);
    let x_range = settings.xlim.unwrap_or_else(|| {
        let span = last - first;
        if span > 0.0 {
            (first - span / 10.0, last + span / 10.0)
        } else {
            padded_range(first, last, 0.1)
        }
    });

    let rows = unique_in_order(categories);
    let y_range = (-0.5, rows.len() as f64 - 0.5);
    let mut panel = Panel::new(0, 0, x_range, y_range);

    for (i, ((category, start), end)) in categories.iter().zip(&start_nums).zip(&end_nums).enumerate() {
        let row = rows.iter().position(|r| r == category).unwrap_or(0) as f64;
        panel.push(DrawCommand::Rect {
            from: (*start, row - height / 2.0),
            to: (*end, row + height / 2.0),
            style: ShapeStyle::filled(palette.get_color(i)).with_edge(edge),
            legend: None,
        });
    }

    panel.y_axis.ticks = category_ticks(&rows, 0.0);
    panel.y_axis.label = settings.ylabel.clone();
    panel.x_axis.label = settings.xlabel.clone();
    if !settings.suppress_date_format.unwrap_or(false) {
        panel.x_axis.ticks = Ticks::Dates {
            format: settings.date_format.clone().unwrap_or_else(|| "%Y".into()),
        };
    }
    let grid = settings.grid_or(true);
    panel.x_axis.grid = grid;
    panel.y_axis.grid = grid;

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
