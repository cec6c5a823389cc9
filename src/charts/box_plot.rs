use super::{color_setting, points_to_px, require_data, Orientation};
use crate::error::Result;
use crate::ir::{
    DrawCommand, Figure, LineStyle, Marker, MarkerStyle, Panel, ShapeStyle, Ticks,
};
use crate::layout::{box_stats, min_max, padded_range};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

const POSITION: f64 = 1.0;
const BOX_WIDTH: f64 = 0.5;
const CAP_WIDTH: f64 = 0.25;

fn defaults() -> Settings {
    Settings {
        figsize: Some((6.4, 4.8)),
        title: Some("Box Plot of Values".into()),
        color: Some("white".into()),
        edgecolor: Some("black".into()),
        line_width: Some(2.0),
        grid: Some(true),
        tick_labels: Some(vec!["Value Set".into()]),
        ..Default::default()
    }
}

/// Maps a (position, value) pair into panel coordinates.
fn place(orientation: Orientation, pos: f64, value: f64) -> (f64, f64) {
    if orientation.is_horizontal() {
        (value, pos)
    } else {
        (pos, value)
    }
}

/// Box-and-whisker plot of a single value set.
pub fn box_plot(values: &[f64], orientation: Orientation, options: &ChartOptions) -> Result<Figure> {
    require_data(values.len(), "box plot")?;
    let settings = options.resolve(defaults());
    let stats = box_stats(values)?;

    let fill = color_setting(&settings.color, Color::WHITE)?;
    let edge = color_setting(&settings.edgecolor, Color::BLACK)?;
    let median_width = settings.line_width.unwrap_or(2.0);

    let (lo, hi) = min_max(values);
    let value_range = padded_range(lo, hi, 0.05);
    let pos_range = (0.5, 1.5);
    let (x_range, y_range) = if orientation.is_horizontal() {
        (value_range, pos_range)
    } else {
        (pos_range, value_range)
    };
    let mut panel = Panel::new(0, 0, x_range, y_range);

    let half = BOX_WIDTH / 2.0;
    panel.push(DrawCommand::Rect {
        from: place(orientation, POSITION - half, stats.q1),
        to: place(orientation, POSITION + half, stats.q3),
        style: ShapeStyle::filled(fill).with_edge(edge),
        legend: None,
    });

    let thin = LineStyle::solid(edge, 1.0);
    let whiskers = [
        (stats.q1, stats.whisker_low),
        (stats.q3, stats.whisker_high),
    ];
    for (from, to) in whiskers {
        panel.push(DrawCommand::Polyline {
            points: vec![place(orientation, POSITION, from), place(orientation, POSITION, to)],
            style: thin,
            legend: None,
        });
        panel.push(DrawCommand::Polyline {
            points: vec![
                place(orientation, POSITION - CAP_WIDTH / 2.0, to),
                place(orientation, POSITION + CAP_WIDTH / 2.0, to),
            ],
            style: thin,
            legend: None,
        });
    }

    panel.push(DrawCommand::Polyline {
        points: vec![
            place(orientation, POSITION - half, stats.median),
            place(orientation, POSITION + half, stats.median),
        ],
        style: LineStyle::solid(Color::BLACK, median_width),
        legend: None,
    });

    if !stats.fliers.is_empty() {
        panel.push(DrawCommand::Markers {
            points: stats
                .fliers
                .iter()
                .map(|v| place(orientation, POSITION, *v))
                .collect(),
            style: MarkerStyle {
                marker: Marker::Circle,
                size: points_to_px(6.0, &settings),
                fill: Color::WHITE,
                edge: Some(edge),
            },
            legend: None,
        });
    }

    let tick_label = settings
        .tick_labels
        .as_ref()
        .and_then(|t| t.first().cloned())
        .unwrap_or_default();
    let grid = settings.grid_or(true);
    let (pos_axis, value_axis) = if orientation.is_horizontal() {
        (&mut panel.y_axis, &mut panel.x_axis)
    } else {
        (&mut panel.x_axis, &mut panel.y_axis)
    };
    pos_axis.ticks = Ticks::Fixed(vec![(POSITION, tick_label)]);
    value_axis.label = Some(if orientation.is_horizontal() {
        settings.xlabel_or("Values")
    } else {
        settings.ylabel_or("Values")
    });
    value_axis.grid = grid;

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_plot_primitives() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let figure = box_plot(&values, Orientation::Vertical, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.rect_count(), 1);
        // the single outlier
        assert_eq!(panel.marker_count(), 1);
        assert_eq!(figure.title.as_deref(), Some("Box Plot of Values"));
        assert_eq!(panel.y_axis.label.as_deref(), Some("Values"));
        assert!(panel.y_axis.grid);
        assert_eq!(panel.x_axis.ticks, Ticks::Fixed(vec![(1.0, "Value Set".into())]));
    }

    #[test]
    fn test_box_plot_median_line_style() {
        let figure = box_plot(&[1.0, 2.0, 3.0], Orientation::Vertical, &ChartOptions::default()).unwrap();
        let median = figure.panels[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Polyline { points, style, .. } if style.width == 2.0 => Some(points),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(median[0].1, 2.0);
    }

    #[test]
    fn test_box_plot_horizontal() {
        let figure = box_plot(&[1.0, 2.0, 3.0], Orientation::Horizontal, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.x_axis.label.as_deref(), Some("Values"));
        assert!(panel.x_axis.grid);
        assert!(matches!(panel.y_axis.ticks, Ticks::Fixed(_)));
    }

    #[test]
    fn test_box_plot_empty() {
        assert!(box_plot(&[], Orientation::Vertical, &ChartOptions::default()).is_err());
    }
}
