use super::{require_data, unique_sorted};
use crate::error::Result;
use crate::ir::{Anchor, Axis, DrawCommand, Figure, Panel, ShapeStyle};
use crate::options::{ChartOptions, Settings};
use crate::palette::Color;

const HEADER: [&str; 2] = ["Category", "Count"];

fn defaults(n_rows: usize) -> Settings {
    Settings {
        figsize: Some((4.0, (0.4 * (n_rows + 1) as f64).max(1.0))),
        font_size: Some(10),
        ..Default::default()
    }
}

/// Two-column list of the distinct categories and how often each occurs.
pub fn table_list(categories: &[String], options: &ChartOptions) -> Result<Figure> {
    require_data(categories.len(), "list table")?;
    let distinct = unique_sorted(categories);
    let settings = options.resolve(defaults(distinct.len()));
    let font_size = settings.font_size.unwrap_or(10);

    let n_rows = distinct.len() + 1;
    let extent_x = (0.0, 2.0);
    let extent_y = (0.0, n_rows as f64);
    let mut panel = Panel::new(0, 0, extent_x, extent_y);
    panel.x_axis = Axis::hidden(extent_x);
    panel.y_axis = Axis::hidden(extent_y);

    let mut rows: Vec<[String; 2]> = vec![[HEADER[0].to_string(), HEADER[1].to_string()]];
    rows.extend(distinct.iter().map(|d| {
        let count = categories.iter().filter(|c| *c == d).count();
        [d.clone(), count.to_string()]
    }));

    for (i, row) in rows.into_iter().enumerate() {
        // header on top
        let y = (n_rows - 1 - i) as f64;
        let fill = if i == 0 { Color::rgb(211, 211, 211) } else { Color::WHITE };
        for (j, text) in row.into_iter().enumerate() {
            let x = j as f64;
            panel.push(DrawCommand::Rect {
                from: (x, y),
                to: (x + 1.0, y + 1.0),
                style: ShapeStyle::filled(fill).with_edge(Color::BLACK),
                legend: None,
            });
            panel.push(DrawCommand::Text {
                position: (x + 0.5, y + 0.5),
                text,
                color: Color::BLACK,
                size: font_size,
                anchor: Anchor::Center,
            });
        }
    }

    let mut figure = Figure::single(&settings, panel);
    figure.title = settings.title.clone();
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_list_counts() {
        let categories: Vec<String> = ["Flu", "Asthma", "Flu"].iter().map(|s| s.to_string()).collect();
        let figure = table_list(&categories, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.rect_count(), 6);
        assert_eq!(panel.texts(), vec!["Category", "Count", "Asthma", "1", "Flu", "2"]);
    }

    #[test]
    fn test_table_list_empty() {
        assert!(table_list(&[], &ChartOptions::default()).is_err());
    }
}
