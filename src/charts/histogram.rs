use super::{color_setting, format_number, Orientation};
use crate::error::{ChartError, Result};
use crate::ir::{DrawCommand, Figure, Panel, ShapeStyle, Ticks};
use crate::layout::{self, Bins};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

fn defaults() -> Settings {
    Settings {
        title: Some("Histogram of Values".into()),
        xlabel: Some("Value".into()),
        ylabel: Some("Frequency".into()),
        color: Some("gray".into()),
        edgecolor: Some("black".into()),
        ..Default::default()
    }
}

/// Histogram with gray bars. `tick_labels`, when set, label the bin centers.
pub fn histogram(values: &[f64], bins: &Bins, orientation: Orientation, options: &ChartOptions) -> Result<Figure> {
    let hist = layout::histogram(values, bins)?;
    let settings = options.resolve(defaults());
    let style = ShapeStyle::filled(color_setting(&settings.color, Color::GRAY)?)
        .with_edge(color_setting(&settings.edgecolor, Color::BLACK)?)
        .with_alpha(settings.alpha.unwrap_or(1.0));

    let first = hist.edges[0];
    let last = hist.edges[hist.edges.len() - 1];
    let max_count = hist.counts.iter().copied().max().unwrap_or(0) as f64;
    let value_range = layout::padded_range(first, last, 0.05);
    let count_range = (0.0, (max_count * 1.05).max(1.0));

    let mut panel = if orientation.is_horizontal() {
        Panel::new(0, 0, count_range, value_range)
    } else {
        Panel::new(0, 0, value_range, count_range)
    };

    for (edge, count) in hist.edges.windows(2).zip(&hist.counts) {
        let count = *count as f64;
        let (from, to) = if orientation.is_horizontal() {
            ((0.0, edge[0]), (count, edge[1]))
        } else {
            ((edge[0], 0.0), (edge[1], count))
        };
        panel.push(DrawCommand::Rect {
            from,
            to,
            style,
            legend: None,
        });
    }

    let value_label = settings.xlabel_or("Value");
    let count_label = settings.ylabel_or("Frequency");
    let value_ticks = match &settings.tick_labels {
        Some(labels) if labels.len() != hist.counts.len() => {
            return Err(ChartError::Validation(format!(
                "Expected {} tick labels, one per bin (got {})",
                hist.counts.len(),
                labels.len()
            )));
        }
        Some(labels) => Ticks::Fixed(
            hist.edges
                .windows(2)
                .map(|e| (e[0] + e[1]) / 2.0)
                .zip(labels.iter().cloned())
                .collect(),
        ),
        None => Ticks::Auto,
    };

    let (value_axis, count_axis) = if orientation.is_horizontal() {
        (&mut panel.y_axis, &mut panel.x_axis)
    } else {
        (&mut panel.x_axis, &mut panel.y_axis)
    };
    value_axis.label = Some(value_label);
    value_axis.ticks = value_ticks;
    count_axis.label = Some(count_label);
    count_axis.grid = settings.grid_or(false);

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    log::debug!(
        "histogram: {} bins from {} to {}",
        hist.counts.len(),
        format_number(first),
        format_number(last)
    );
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_default_bins() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let figure = histogram(&values, &Bins::default(), Orientation::Vertical, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.rect_count(), 10);
        assert_eq!(panel.x_axis.label.as_deref(), Some("Value"));
        assert_eq!(panel.y_axis.label.as_deref(), Some("Frequency"));
        assert_eq!(figure.title.as_deref(), Some("Histogram of Values"));
    }

    #[test]
    fn test_histogram_horizontal_swaps_axes() {
        let figure = histogram(&[1.0, 2.0, 3.0], &Bins::Count(3), Orientation::Horizontal, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.y_axis.label.as_deref(), Some("Value"));
        assert_eq!(panel.x_axis.label.as_deref(), Some("Frequency"));
    }

    #[test]
    fn test_histogram_custom_tick_labels() {
        let options = ChartOptions {
            overrides: Settings {
                tick_labels: Some(vec!["low".into(), "high".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let figure = histogram(&[0.0, 1.0, 2.0], &Bins::Count(2), Orientation::Vertical, &options).unwrap();
        assert_eq!(
            figure.panels[0].x_axis.ticks,
            Ticks::Fixed(vec![(0.5, "low".into()), (1.5, "high".into())])
        );

        let result = histogram(&[0.0, 1.0, 2.0], &Bins::Count(3), Orientation::Vertical, &options);
        assert!(result.is_err());
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], &Bins::default(), Orientation::Vertical, &ChartOptions::default()).is_err());
    }
}
