use super::{category_ticks, color_setting, require_data, unique_in_order, Orientation};
use crate::error::{ensure_same_len, Result};
use crate::ir::{DrawCommand, Figure, Panel, ShapeStyle};
use crate::layout::{min_max, padded_range};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

fn defaults(orientation: Orientation) -> Settings {
    let (xlabel, ylabel) = if orientation.is_horizontal() {
        ("Values", "Categories")
    } else {
        ("Categories", "Values")
    };
    Settings {
        title: Some("Bar Chart".into()),
        xlabel: Some(xlabel.into()),
        ylabel: Some(ylabel.into()),
        color: Some("gray".into()),
        edgecolor: Some("black".into()),
        bar_width: Some(0.8),
        ..Default::default()
    }
}

/// One bar per record. Repeated categories share a slot.
pub fn bar(
    categories: &[String],
    values: &[f64],
    orientation: Orientation,
    options: &ChartOptions,
) -> Result<Figure> {
    ensure_same_len(&[("categories", categories.len()), ("values", values.len())])?;
    require_data(values.len(), "bar chart")?;

    let settings = options.resolve(defaults(orientation));
    let fill = color_setting(&settings.color, Color::GRAY)?;
    let edge = color_setting(&settings.edgecolor, Color::BLACK)?;
    let width = settings.bar_width.unwrap_or(0.8);
    let style = ShapeStyle::filled(fill)
        .with_edge(edge)
        .with_alpha(settings.alpha.unwrap_or(1.0));

    let slots = unique_in_order(categories);
    let (lo, hi) = min_max(values);
    let value_range = settings
        .ylim
        .unwrap_or_else(|| padded_range(lo.min(0.0), hi.max(0.0), 0.05));
    let slot_range = (-0.5, slots.len() as f64 - 0.5);

    let mut panel = if orientation.is_horizontal() {
        Panel::new(0, 0, value_range, slot_range)
    } else {
        Panel::new(0, 0, slot_range, value_range)
    };

    for (category, value) in categories.iter().zip(values) {
        let slot = slots.iter().position(|s| s == category).unwrap_or(0) as f64;
        let (from, to) = if orientation.is_horizontal() {
            ((0.0, slot - width / 2.0), (*value, slot + width / 2.0))
        } else {
            ((slot - width / 2.0, 0.0), (slot + width / 2.0, *value))
        };
        panel.push(DrawCommand::Rect {
            from,
            to,
            style,
            legend: None,
        });
    }

    let (slot_axis, value_axis) = if orientation.is_horizontal() {
        (&mut panel.y_axis, &mut panel.x_axis)
    } else {
        (&mut panel.x_axis, &mut panel.y_axis)
    };
    slot_axis.ticks = category_ticks(&slots, 0.0);
    value_axis.grid = settings.grid_or(false);
    panel.x_axis.label = settings.xlabel.clone();
    panel.y_axis.label = settings.ylabel.clone();

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use crate::ir::Ticks;

    fn cats(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bar_one_rect_per_record() {
        let figure = bar(
            &cats(&["A", "B", "C"]),
            &[10.0, 20.0, 15.0],
            Orientation::Vertical,
            &ChartOptions::default(),
        )
        .unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.rect_count(), 3);
        assert_eq!(figure.title.as_deref(), Some("Bar Chart"));
        assert_eq!(panel.x_axis.label.as_deref(), Some("Categories"));
        assert_eq!(panel.y_axis.label.as_deref(), Some("Values"));
        assert!(matches!(&panel.x_axis.ticks, Ticks::Fixed(t) if t.len() == 3));
    }

    #[test]
    fn test_bar_horizontal_swaps_labels() {
        let figure = bar(
            &cats(&["A", "B"]),
            &[1.0, 2.0],
            Orientation::Horizontal,
            &ChartOptions::default(),
        )
        .unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.x_axis.label.as_deref(), Some("Values"));
        assert!(matches!(&panel.y_axis.ticks, Ticks::Fixed(_)));
    }

    #[test]
    fn test_bar_length_mismatch_fails() {
        let result = bar(
            &cats(&["A", "B", "C"]),
            &[1.0, 2.0],
            Orientation::Vertical,
            &ChartOptions::default(),
        );
        assert!(matches!(result, Err(ChartError::LengthMismatch { .. })));
    }

    #[test]
    fn test_bar_empty_fails() {
        let result = bar(&[], &[], Orientation::Vertical, &ChartOptions::default());
        assert!(matches!(result, Err(ChartError::EmptyData(_))));
    }

    #[test]
    fn test_bar_title_override() {
        let options = ChartOptions {
            overrides: Settings {
                title: Some("Visits".into()),
                color: Some("black".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let figure = bar(&cats(&["A"]), &[3.0], Orientation::Vertical, &options).unwrap();
        assert_eq!(figure.title.as_deref(), Some("Visits"));
        match &figure.panels[0].commands[0] {
            DrawCommand::Rect { style, .. } => assert_eq!(style.fill, Some(Color::BLACK)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bar_unknown_color_fails() {
        let options = ChartOptions {
            plot: Settings {
                color: Some("no-such-color".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(bar(&cats(&["A"]), &[3.0], Orientation::Vertical, &options).is_err());
    }
}
