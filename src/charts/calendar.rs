use super::{require_data, unique_in_order};
use crate::error::{ChartError, Result};
use crate::ir::{DrawCommand, Figure, Panel, ShapeStyle, Ticks};
use crate::layout::{calendar_dot_size, calendar_grid, pack_cell, CellPacking};
use crate::options::{ChartOptions, Settings, DEFAULT_FIGSIZE};
use crate::palette::Color;
use crate::table::{ColumnSelector, Table};
use chrono::Datelike;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_DOT_SIZE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct CalendarCell {
    pub row: usize,
    pub col: usize,
    pub count: usize,
    pub packing: CellPacking,
}

/// Grid geometry and per-cell packing, in figure units (inches).
#[derive(Debug, Clone)]
pub struct CalendarLayout {
    pub rows: Vec<String>,
    pub years: Vec<i32>,
    pub col_width: f64,
    pub row_height: f64,
    /// Chart-wide marker size before any cell grew it
    pub dot_size: f64,
    pub cells: Vec<CalendarCell>,
}

impl CalendarLayout {
    pub fn drawn(&self) -> usize {
        self.cells.iter().map(|c| c.packing.drawn).sum()
    }

    pub fn skipped(&self) -> usize {
        self.cells.iter().map(|c| c.packing.skipped).sum()
    }
}

/// Count records per (category, year) and pack each count into its cell.
///
/// Cells are packed row by row; once a crowded cell grows the marker size,
/// every later cell keeps the larger size.
pub fn calendar_layout(
    table: &Table,
    y_column: &str,
    x_column: &str,
    dot_size: f64,
    figsize: (f64, f64),
) -> Result<CalendarLayout> {
    let categories = table
        .column(&ColumnSelector::Name(y_column.to_string()))?
        .to_strings();
    let dates = table
        .column(&ColumnSelector::Name(x_column.to_string()))?
        .to_datetimes()?;
    require_data(dates.len(), "calendar")?;
    if !dot_size.is_finite() || dot_size <= 0.0 {
        return Err(ChartError::Validation(format!(
            "Dot size must be a positive number, got {}",
            dot_size
        )));
    }

    let rows = unique_in_order(&categories);
    let years: Vec<i32> = dates
        .iter()
        .map(|d| d.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
    for (category, date) in categories.iter().zip(&dates) {
        let i = rows.iter().position(|r| r == category).unwrap_or(0);
        let j = years.iter().position(|y| *y == date.year()).unwrap_or(0);
        *counts.entry((i, j)).or_insert(0) += 1;
    }

    let (col_width, row_height) = calendar_grid(figsize, rows.len(), years.len());
    let dot_size = calendar_dot_size(dot_size, col_width, row_height, dates.len());

    let mut size = dot_size;
    let mut cells = Vec::with_capacity(rows.len() * years.len());
    for row in 0..rows.len() {
        for col in 0..years.len() {
            let count = counts.get(&(row, col)).copied().unwrap_or(0);
            let packing = pack_cell(
                col as f64 * col_width,
                row as f64 * row_height,
                col_width,
                row_height,
                count,
                size,
            );
            size = packing.dot_size;
            cells.push(CalendarCell {
                row,
                col,
                count,
                packing,
            });
        }
    }

    let layout = CalendarLayout {
        rows,
        years,
        col_width,
        row_height,
        dot_size,
        cells,
    };
    if layout.skipped() > 0 {
        log::debug!(
            "calendar drew {} of {} markers",
            layout.drawn(),
            layout.drawn() + layout.skipped()
        );
    }
    Ok(layout)
}

fn defaults() -> Settings {
    Settings {
        figsize: Some(DEFAULT_FIGSIZE),
        title: Some("Calendar Heatmap".into()),
        xlabel: Some("Year".into()),
        ylabel: Some("Disease".into()),
        ..Default::default()
    }
}

/// Calendar view: a category-by-year grid where each record is a small square.
pub fn calendar(
    table: &Table,
    y_column: &str,
    x_column: &str,
    dot_size: f64,
    options: &ChartOptions,
) -> Result<Figure> {
    let settings = options.resolve(defaults());
    let (width, height) = settings.figsize();
    let layout = calendar_layout(table, y_column, x_column, dot_size, (width, height))?;

    let mut panel = Panel::new(0, 0, (0.0, width), (0.0, height));
    let background = ShapeStyle::filled(Color::WHITE).with_edge(Color::BLACK);
    let dot = ShapeStyle::filled(Color::GRAY).with_edge(Color::BLACK);

    for cell in &layout.cells {
        let x0 = cell.col as f64 * layout.col_width;
        let y0 = cell.row as f64 * layout.row_height;
        panel.push(DrawCommand::Rect {
            from: (x0, y0),
            to: (x0 + layout.col_width, y0 + layout.row_height),
            style: background,
            legend: None,
        });
        let size = cell.packing.dot_size;
        for (x, y) in &cell.packing.markers {
            panel.push(DrawCommand::Rect {
                from: (*x, *y),
                to: (x + size, y + size),
                style: dot,
                legend: None,
            });
        }
    }

    panel.x_axis.ticks = Ticks::Fixed(
        layout
            .years
            .iter()
            .enumerate()
            .map(|(j, y)| (layout.col_width * (j as f64 + 0.5), y.to_string()))
            .collect(),
    );
    panel.y_axis.ticks = Ticks::Fixed(
        layout
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (layout.row_height * (i as f64 + 0.5), r.clone()))
            .collect(),
    );
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
    use crate::table::Column;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn outbreaks() -> Table {
        Table::new(vec![
            Column::text("Disease", vec!["Flu", "Flu", "Measles", "Flu"]),
            Column::datetimes(
                "obsdate",
                vec![day(2019, 1, 1), day(2019, 3, 1), day(2020, 1, 1), day(2021, 6, 1)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_calendar_layout_grid() {
        let layout = calendar_layout(&outbreaks(), "Disease", "obsdate", DEFAULT_DOT_SIZE, (6.0, 4.0)).unwrap();
        assert_eq!(layout.rows, vec!["Flu", "Measles"]);
        assert_eq!(layout.years, vec![2019, 2020, 2021]);
        assert_eq!(layout.cells.len(), 6);
        assert_eq!((layout.col_width, layout.row_height), (2.0, 2.0));
        let flu_2019 = layout.cells.iter().find(|c| c.row == 0 && c.col == 0).unwrap();
        assert_eq!(flu_2019.count, 2);
        assert_eq!(layout.drawn(), 4);
        assert_eq!(layout.skipped(), 0);
    }

    #[test]
    fn test_calendar_figure_primitives() {
        let figure = calendar(&outbreaks(), "Disease", "obsdate", DEFAULT_DOT_SIZE, &ChartOptions::default()).unwrap();
        let panel = &figure.panels[0];
        // 6 background cells + 4 dots
        assert_eq!(panel.rect_count(), 10);
        assert_eq!(figure.title.as_deref(), Some("Calendar Heatmap"));
        assert_eq!(panel.x_axis.label.as_deref(), Some("Year"));
        assert_eq!(panel.y_axis.label.as_deref(), Some("Disease"));
        assert_eq!(panel.x_axis.range, (0.0, 6.0));
    }

    #[test]
    fn test_calendar_dots_stay_inside_cells() {
        let n = 500;
        let table = Table::new(vec![
            Column::text("Disease", vec!["Flu"; n]),
            Column::datetimes("obsdate", vec![day(2020, 1, 1); n]),
        ])
        .unwrap();
        let layout = calendar_layout(&table, "Disease", "obsdate", DEFAULT_DOT_SIZE, (6.0, 4.0)).unwrap();
        let cell = &layout.cells[0];
        assert!(cell.packing.drawn <= n);
        for (x, y) in &cell.packing.markers {
            assert!(x + cell.packing.dot_size < layout.col_width);
            assert!(y + cell.packing.dot_size < layout.row_height);
        }
    }

    #[test]
    fn test_calendar_grown_dot_size_carries_to_later_cells() {
        let mut diseases = vec!["Flu"; 1000];
        diseases.push("Measles");
        let table = Table::new(vec![
            Column::text("Disease", diseases),
            Column::datetimes("obsdate", vec![day(2020, 1, 1); 1001]),
        ])
        .unwrap();
        let layout = calendar_layout(&table, "Disease", "obsdate", DEFAULT_DOT_SIZE, (6.0, 4.0)).unwrap();
        assert!(layout.dot_size < 0.16);
        let (crowded, sparse) = (&layout.cells[0], &layout.cells[1]);
        assert_eq!((crowded.count, sparse.count), (1000, 1));
        assert!((crowded.packing.dot_size - 2.0 / 12.0).abs() < 1e-9);
        assert_eq!(sparse.packing.dot_size, crowded.packing.dot_size);
    }

    #[test]
    fn test_calendar_rejects_non_positive_dot_size() {
        for size in [0.0, -0.2, f64::NAN, f64::INFINITY] {
            let err = calendar_layout(&outbreaks(), "Disease", "obsdate", size, (6.0, 4.0)).unwrap_err();
            assert!(matches!(err, ChartError::Validation(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_calendar_tiny_dot_size_does_not_overflow() {
        let layout = calendar_layout(&outbreaks(), "Disease", "obsdate", 1e-12, (6.0, 4.0)).unwrap();
        assert_eq!(layout.drawn() + layout.skipped(), 4);
    }

    #[test]
    fn test_calendar_missing_column() {
        let err = calendar_layout(&outbreaks(), "Country", "obsdate", DEFAULT_DOT_SIZE, (6.0, 4.0)).unwrap_err();
        assert!(matches!(err, ChartError::ColumnNotFound { .. }));
    }
}
