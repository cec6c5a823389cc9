use super::{color_setting, require_data, Orientation};
use crate::error::Result;
use crate::ir::{DrawCommand, Figure, Legend, LineStyle, Panel, ShapeStyle, Ticks};
use crate::layout::{gaussian_kde, linspace, min_max, padded_range, quantile};
use crate::options::{ChartOptions, Settings};
use crate::palette::{greys, Color};

const POSITION: f64 = 1.0;
const HALF_WIDTH: f64 = 0.25;
const BAR_HALF: f64 = 0.125;
const SAMPLES: usize = 100;

fn defaults(orientation: Orientation) -> Settings {
    let (xlabel, ylabel) = if orientation.is_horizontal() {
        ("Values", "")
    } else {
        ("", "Values")
    };
    Settings {
        title: Some("Violin Plot of Values".into()),
        xlabel: Some(xlabel.into()),
        ylabel: Some(ylabel.into()),
        edgecolor: Some("black".into()),
        alpha: Some(0.3),
        grid: Some(true),
        legend: Some(false),
        tick_labels: Some(vec!["Value Set".into()]),
        ..Default::default()
    }
}

fn place(orientation: Orientation, pos: f64, value: f64) -> (f64, f64) {
    if orientation.is_horizontal() {
        (value, pos)
    } else {
        (pos, value)
    }
}

/// Violin plot: mirrored kernel density with extrema bars and a red median.
pub fn violin(values: &[f64], orientation: Orientation, options: &ChartOptions) -> Result<Figure> {
    require_data(values.len(), "violin plot")?;
    let settings = options.resolve(defaults(orientation));

    let (lo, hi) = min_max(values);
    let grid = linspace(lo, hi, SAMPLES);
    let density = gaussian_kde(values, &grid);
    let peak = density.iter().cloned().fold(0.0, f64::max);
    let widths: Vec<f64> = density
        .iter()
        .map(|d| if peak > 0.0 { d / peak * HALF_WIDTH } else { 0.0 })
        .collect();

    let mut body: Vec<(f64, f64)> = grid
        .iter()
        .zip(&widths)
        .map(|(v, w)| place(orientation, POSITION + w, *v))
        .collect();
    body.extend(
        grid.iter()
            .zip(&widths)
            .rev()
            .map(|(v, w)| place(orientation, POSITION - w, *v)),
    );

    let value_range = padded_range(lo, hi, 0.1);
    let pos_range = (0.5, 1.5);
    let (x_range, y_range) = if orientation.is_horizontal() {
        (value_range, pos_range)
    } else {
        (pos_range, value_range)
    };
    let mut panel = Panel::new(0, 0, x_range, y_range);

    let fill = color_setting(&settings.color, greys(0.3))?;
    let edge = color_setting(&settings.edgecolor, Color::BLACK)?;
    let legend = settings
        .legend_or(false)
        .then(|| "Violin Plot".to_string());
    if legend.is_some() {
        panel.legend = Some(Legend { title: None });
    }
    panel.push(DrawCommand::Polygon {
        points: body,
        style: ShapeStyle::filled(fill)
            .with_edge(edge)
            .with_alpha(settings.alpha.unwrap_or(0.3)),
        legend,
    });

    let bar = LineStyle::solid(Color::BLACK, 1.0);
    panel.push(DrawCommand::Polyline {
        points: vec![place(orientation, POSITION, lo), place(orientation, POSITION, hi)],
        style: bar,
        legend: None,
    });
    for extreme in [lo, hi] {
        panel.push(DrawCommand::Polyline {
            points: vec![
                place(orientation, POSITION - BAR_HALF, extreme),
                place(orientation, POSITION + BAR_HALF, extreme),
            ],
            style: bar,
            legend: None,
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = quantile(&sorted, 0.5);
    panel.push(DrawCommand::Polyline {
        points: vec![
            place(orientation, POSITION - BAR_HALF, median),
            place(orientation, POSITION + BAR_HALF, median),
        ],
        style: LineStyle::solid(Color::RED, 1.0),
        legend: None,
    });

    let tick_label = settings
        .tick_labels
        .as_ref()
        .and_then(|t| t.first().cloned())
        .unwrap_or_default();
    let show_grid = settings.grid_or(true);
    panel.x_axis.label = settings.xlabel.clone().filter(|l| !l.is_empty());
    panel.y_axis.label = settings.ylabel.clone().filter(|l| !l.is_empty());
    let (pos_axis, value_axis) = if orientation.is_horizontal() {
        (&mut panel.y_axis, &mut panel.x_axis)
    } else {
        (&mut panel.x_axis, &mut panel.y_axis)
    };
    pos_axis.ticks = Ticks::Fixed(vec![(POSITION, tick_label)]);
    value_axis.grid = show_grid;

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
