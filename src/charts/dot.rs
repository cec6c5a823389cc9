use super::{color_setting, points_to_px, require_data};
use crate::error::Result;
use crate::ir::{Axis, DrawCommand, Figure, Marker, MarkerStyle, Panel};
use crate::layout::{min_max, padded_range, value_counts};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

fn defaults() -> Settings {
    Settings {
        color: Some("black".into()),
        marker: Some("o".into()),
        marker_size: Some(10.0),
        ..Default::default()
    }
}

/// Dot plot: each distinct value gets a column of stacked markers, one per occurrence.
pub fn dot(values: &[f64], options: &ChartOptions) -> Result<Figure> {
    require_data(values.len(), "dot plot")?;
    let settings = options.resolve(defaults());

    let style = MarkerStyle {
        marker: settings.marker.as_deref().unwrap_or("o").parse::<Marker>()?,
        size: points_to_px(settings.marker_size.unwrap_or(10.0), &settings),
        fill: color_setting(&settings.color, Color::BLACK)?,
        edge: None,
    };

    let stacks = value_counts(values);
    let max_count = stacks.iter().map(|(_, c)| *c).max().unwrap_or(1);
    let (lo, hi) = min_max(values);
    let x_range = settings.xlim.unwrap_or_else(|| padded_range(lo, hi, 0.05));
    let y_range = settings.ylim.unwrap_or((-1.0, max_count as f64));

    let mut panel = Panel::new(0, 0, x_range, y_range);
    panel.y_axis = Axis::hidden(y_range);
    panel.x_axis.label = settings.xlabel.clone();

    for (value, count) in stacks {
        panel.push(DrawCommand::Markers {
            points: (0..count).map(|i| (value, i as f64)).collect(),
            style,
            legend: None,
        });
    }

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
