use super::{color_setting, require_data};
use crate::error::{ensure_same_len, Result};
use crate::ir::{Anchor, Axis, DrawCommand, Figure, LineStyle, Panel, ShapeStyle};
use crate::layout::{min_max, radar_angles};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

const EXTENT: (f64, f64) = (-1.35, 1.35);
const LABEL_RADIUS: f64 = 1.15;
const RINGS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

fn defaults() -> Settings {
    Settings {
        title: Some("Radar Chart".into()),
        color: Some("gray".into()),
        alpha: Some(0.25),
        line_width: Some(2.0),
        ..Default::default()
    }
}

fn polar(angle: f64, radius: f64) -> (f64, f64) {
    (radius * angle.cos(), radius * angle.sin())
}

/// Radar chart in cartesian space; the largest value reaches the outer ring.
pub fn radar(categories: &[String], values: &[f64], options: &ChartOptions) -> Result<Figure> {
    ensure_same_len(&[("categories", categories.len()), ("values", values.len())])?;
    require_data(categories.len(), "radar chart")?;

    let settings = options.resolve(defaults());
    let color = color_setting(&settings.color, Color::GRAY)?;
    let angles = radar_angles(categories.len());

    let (lo, hi) = min_max(values);
    let inner = lo.min(0.0);
    let scale = if hi > inner { hi - inner } else { 1.0 };
    let radii: Vec<f64> = values.iter().map(|v| (v - inner) / scale).collect();

    let mut panel = Panel::new(0, 0, EXTENT, EXTENT);
    panel.x_axis = Axis::hidden(EXTENT);
    panel.y_axis = Axis::hidden(EXTENT);

    let guide = LineStyle::solid(Color::rgb(211, 211, 211), 1.0);
    for ring in RINGS {
        let points = (0..=72)
            .map(|i| polar(2.0 * std::f64::consts::PI * i as f64 / 72.0, ring))
            .collect();
        panel.push(DrawCommand::Polyline {
            points,
            style: guide,
            legend: None,
        });
    }
    for (angle, category) in angles.iter().zip(categories) {
        panel.push(DrawCommand::Polyline {
            points: vec![(0.0, 0.0), polar(*angle, 1.0)],
            style: guide,
            legend: None,
        });
        panel.push(DrawCommand::Text {
            position: polar(*angle, LABEL_RADIUS),
            text: category.clone(),
            color: Color::BLACK,
            size: 10,
            anchor: Anchor::Center,
        });
    }

    let mut outline: Vec<(f64, f64)> = angles.iter().zip(&radii).map(|(a, r)| polar(*a, *r)).collect();
    panel.push(DrawCommand::Polygon {
        points: outline.clone(),
        style: ShapeStyle::filled(color).with_alpha(settings.alpha.unwrap_or(0.25)),
        legend: None,
    });
    // close the loop
    outline.push(outline[0]);
    panel.push(DrawCommand::Polyline {
        points: outline,
        style: LineStyle::solid(color, settings.line_width.unwrap_or(2.0)),
        legend: None,
    });

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}
