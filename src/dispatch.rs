//! Chart dispatch by name, and profiler-driven chart selection for a table.

use crate::charts::{
    self, plot_grid, with_now_line, HeatmapMode, Orientation, ScatterData, TimeChartKind, TimeSeries,
};
use crate::error::{ChartError, Result};
use crate::ir::Figure;
use crate::layout::Bins;
use crate::options::{ChartOptions, Settings};
use crate::profile::profile;
use crate::render::{render_png, save_png, SaveOutcome};
use crate::table::{Column, ColumnSelector, Table};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Box,
    Calendar,
    Dot,
    Gantt,
    Heatmap,
    YearlyHeatmap,
    Histogram,
    Line,
    List,
    Pie,
    Radar,
    Scatter,
    Violin,
}

impl ChartKind {
    pub const ALL: [ChartKind; 14] = [
        ChartKind::Bar,
        ChartKind::Box,
        ChartKind::Calendar,
        ChartKind::Dot,
        ChartKind::Gantt,
        ChartKind::Heatmap,
        ChartKind::YearlyHeatmap,
        ChartKind::Histogram,
        ChartKind::Line,
        ChartKind::List,
        ChartKind::Pie,
        ChartKind::Radar,
        ChartKind::Scatter,
        ChartKind::Violin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Box => "box",
            ChartKind::Calendar => "calendar",
            ChartKind::Dot => "dot",
            ChartKind::Gantt => "gantt",
            ChartKind::Heatmap => "heatmap",
            ChartKind::YearlyHeatmap => "yearly",
            ChartKind::Histogram => "hist",
            ChartKind::Line => "line",
            ChartKind::List => "table",
            ChartKind::Pie => "pie",
            ChartKind::Radar => "radar",
            ChartKind::Scatter => "scatter",
            ChartKind::Violin => "violin",
        }
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_ascii_lowercase();
        let alias = match lowered.as_str() {
            "histogram" => "hist",
            "list" => "table",
            "yearly_heatmap" => "yearly",
            other => other,
        };
        ChartKind::ALL
            .into_iter()
            .find(|k| k.name() == alias)
            .ok_or_else(|| ChartError::UnknownChart(s.to_string()))
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-call knobs that are not styling settings
#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub columns: Vec<ColumnSelector>,
    pub orientation: Orientation,
    pub bins: Bins,
    pub dot_size: f64,
    /// Mark this instant on time charts
    pub now: Option<NaiveDateTime>,
}

impl PlotRequest {
    pub fn new(columns: Vec<ColumnSelector>) -> Self {
        PlotRequest {
            columns,
            orientation: Orientation::default(),
            bins: Bins::default(),
            dot_size: charts::calendar::DEFAULT_DOT_SIZE,
            now: None,
        }
    }
}

pub enum Output<'a> {
    Png,
    File { path: &'a Path, overwrite: bool },
}

#[derive(Debug)]
pub enum Plotted {
    Png(Vec<u8>),
    Saved(SaveOutcome),
}

fn require_columns(kind: ChartKind, columns: &[&Column], required: usize) -> Result<()> {
    if columns.len() < required {
        log::debug!("{} needs {} columns, got {}", kind, required, columns.len());
        return Err(ChartError::NotEnoughColumns {
            required,
            found: columns.len(),
        });
    }
    Ok(())
}

/// Parallel interval columns pulled out of a table: category, start, end and an optional value.
struct Intervals {
    categories: Vec<String>,
    starts: Vec<NaiveDateTime>,
    ends: Vec<NaiveDateTime>,
    values: Option<Vec<f64>>,
}

impl Intervals {
    fn from_columns(category: &Column, start: &Column, end: &Column, value: Option<&Column>) -> Result<Self> {
        Ok(Intervals {
            categories: category.to_strings(),
            starts: start.to_datetimes()?,
            ends: end.to_datetimes()?,
            values: value.map(Column::to_f64).transpose()?,
        })
    }

    fn series(&self) -> TimeSeries<'_> {
        let series = TimeSeries::new(&self.categories, &self.starts, &self.ends);
        match &self.values {
            Some(values) => series.with_values(values),
            None => series,
        }
    }
}

fn nested(values: &[f64]) -> Vec<Vec<f64>> {
    values.iter().map(|v| vec![*v]).collect()
}

/// Build the figure for `kind` from the requested table columns.
pub fn build(kind: ChartKind, table: &Table, request: &PlotRequest, options: &ChartOptions) -> Result<Figure> {
    if table.is_empty() {
        return Err(ChartError::EmptyTable);
    }
    let cols = request
        .columns
        .iter()
        .map(|s| table.column(s))
        .collect::<Result<Vec<&Column>>>()?;

    let mut figure = match kind {
        ChartKind::Bar => {
            require_columns(kind, &cols, 2)?;
            charts::bar(&cols[0].to_strings(), &cols[1].to_f64()?, request.orientation, options)?
        }
        ChartKind::Box => {
            require_columns(kind, &cols, 1)?;
            charts::box_plot(&cols[0].to_f64()?, request.orientation, options)?
        }
        ChartKind::Violin => {
            require_columns(kind, &cols, 1)?;
            charts::violin(&cols[0].to_f64()?, request.orientation, options)?
        }
        ChartKind::Histogram => {
            require_columns(kind, &cols, 1)?;
            charts::histogram(&cols[0].to_f64()?, &request.bins, request.orientation, options)?
        }
        ChartKind::Dot => {
            require_columns(kind, &cols, 1)?;
            charts::dot(&cols[0].to_f64()?, options)?
        }
        ChartKind::Radar => {
            require_columns(kind, &cols, 2)?;
            charts::radar(&cols[0].to_strings(), &cols[1].to_f64()?, options)?
        }
        ChartKind::List => {
            require_columns(kind, &cols, 1)?;
            charts::table_list(&cols[0].to_strings(), options)?
        }
        ChartKind::Calendar => {
            require_columns(kind, &cols, 2)?;
            charts::calendar(table, &cols[0].name, &cols[1].name, request.dot_size, options)?
        }
        ChartKind::YearlyHeatmap => {
            require_columns(kind, &cols, 2)?;
            charts::yearly_heatmap(table, &cols[0].name, &cols[1].name, options)?
        }
        ChartKind::Gantt => {
            require_columns(kind, &cols, 3)?;
            let iv = Intervals::from_columns(cols[0], cols[1], cols[2], None)?;
            charts::gantt(&iv.categories, &iv.starts, &iv.ends, options)?
        }
        ChartKind::Line => {
            require_columns(kind, &cols, 3)?;
            let iv = Intervals::from_columns(cols[0], cols[1], cols[2], cols.get(3).copied())?;
            charts::line(&iv.series(), None, options)?
        }
        ChartKind::Pie => match cols.len() {
            0 => return Err(ChartError::NotEnoughColumns { required: 1, found: 0 }),
            1 => charts::pie_counts(&cols[0].to_strings(), options)?,
            2 => charts::pie(&cols[0].to_strings(), &cols[1].to_f64()?, options)?,
            _ => {
                let iv = Intervals::from_columns(cols[0], cols[1], cols[2], None)?;
                charts::pie_intervals(&iv.categories, &iv.starts, &iv.ends, options)?
            }
        },
        ChartKind::Scatter => {
            require_columns(kind, &cols, 2)?;
            if cols.len() == 2 {
                let categories = cols[0].to_strings();
                let values = cols[1].to_f64()?;
                let data = ScatterData::Values {
                    categories: &categories,
                    values: &values,
                };
                charts::scatter(&data, None, options)?
            } else {
                let iv = Intervals::from_columns(cols[0], cols[1], cols[2], cols.get(3).copied())?;
                charts::scatter(&ScatterData::Intervals(iv.series()), None, options)?
            }
        }
        ChartKind::Heatmap => {
            require_columns(kind, &cols, 2)?;
            if cols.len() == 2 {
                let values = nested(&cols[1].to_f64()?);
                charts::heatmap(&cols[0].to_strings(), Some(values.as_slice()), None, None, HeatmapMode::Values, options)?
            } else {
                let iv = Intervals::from_columns(cols[0], cols[1], cols[2], cols.get(3).copied())?;
                let values = iv.values.as_deref().map(nested);
                charts::heatmap(
                    &iv.categories,
                    values.as_deref(),
                    Some(iv.starts.as_slice()),
                    Some(iv.ends.as_slice()),
                    HeatmapMode::Intervals,
                    options,
                )?
            }
        }
    };

    if let Some(now) = request.now {
        if matches!(kind, ChartKind::Line | ChartKind::Scatter | ChartKind::Gantt) && cols.len() >= 3 {
            let label = options.resolve(Settings::default()).now_label;
            with_now_line(&mut figure, now, label.as_deref());
        }
    }
    Ok(figure)
}

/// Build a chart and either return its PNG bytes or write it to a file.
pub fn plot(
    kind: ChartKind,
    table: &Table,
    request: &PlotRequest,
    options: &ChartOptions,
    output: Output,
) -> Result<Plotted> {
    let figure = build(kind, table, request, options)?;
    match output {
        Output::Png => Ok(Plotted::Png(render_png(&figure)?)),
        Output::File { path, overwrite } => Ok(Plotted::Saved(save_png(&figure, path, overwrite)?)),
    }
}

/// Stack one grouped time chart per kind, all over the same interval columns.
pub fn plot_time_grid(
    table: &Table,
    request: &PlotRequest,
    kinds: &[TimeChartKind],
    options: &ChartOptions,
) -> Result<Option<Figure>> {
    let cols = request
        .columns
        .iter()
        .map(|s| table.column(s))
        .collect::<Result<Vec<&Column>>>()?;
    if cols.len() < 3 {
        return Err(ChartError::NotEnoughColumns {
            required: 3,
            found: cols.len(),
        });
    }
    let iv = Intervals::from_columns(cols[0], cols[1], cols[2], cols.get(3).copied())?;
    let n = kinds.len();
    let values = iv.values.as_ref().map(|v| vec![v.clone(); n]);
    plot_grid(
        &vec![iv.categories.clone(); n],
        &vec![iv.starts.clone(); n],
        &vec![iv.ends.clone(); n],
        kinds,
        values.as_deref(),
        options,
    )
}

/// Position of the first column whose lowercased name contains `needle`
fn find_column(names: &[String], needle: &str) -> Option<usize> {
    names.iter().position(|n| n.to_lowercase().contains(needle))
}

/// Start and end columns for interval charts: matched by name, otherwise the
/// temporal columns in order.
fn interval_columns(selected: &Table) -> Result<(usize, usize)> {
    let names = selected.headers();
    let temporal: Vec<usize> = selected
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_temporal())
        .map(|(i, _)| i)
        .collect();
    let by_start = find_column(&names, "start");
    let by_end = find_column(&names, "end").filter(|i| Some(*i) != by_start);
    let start = by_start.or_else(|| temporal.iter().copied().find(|i| Some(*i) != by_end));
    let end = by_end.or_else(|| temporal.iter().copied().find(|i| Some(*i) != start));
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ChartError::Validation(
            "Could not find start and end date columns".into(),
        )),
    }
}

type Attempt<'a> = (ChartKind, Box<dyn Fn() -> Result<Figure> + 'a>);

/// Pick charts for the referenced columns from their type profile and build
/// every candidate. Charts that fail to build are logged and skipped.
pub fn plot_charts(
    table: &Table,
    column_refs: &[ColumnSelector],
    options: &ChartOptions,
) -> Result<Vec<(ChartKind, Figure)>> {
    if column_refs.is_empty() {
        return Err(ChartError::Validation(
            "No column references provided for plotting.".into(),
        ));
    }
    let selected = table.select(column_refs)?;
    let profiled = profile(&selected, column_refs.len())?;
    log::info!("Column types {} suggest {:?}", profiled.code, profiled.suggestions);

    let first = |tag| {
        profiled
            .first_with(tag)
            .map(|name| selected.column_by_name(name))
            .transpose()
    };
    use crate::profile::TypeTag::{Nominal, Ordinal, Quantitative};

    let mut attempts: Vec<Attempt> = Vec::new();
    match profiled.code.as_str() {
        "Q" => {
            let values = first(Quantitative)?.map(Column::to_f64).transpose()?.unwrap_or_default();
            let v = values.clone();
            attempts.push((ChartKind::Histogram, Box::new(move || {
                charts::histogram(&v, &Bins::default(), Orientation::Vertical, options)
            })));
            let v = values.clone();
            attempts.push((ChartKind::Violin, Box::new(move || charts::violin(&v, Orientation::Vertical, options))));
            attempts.push((ChartKind::Box, Box::new(move || charts::box_plot(&values, Orientation::Vertical, options))));
        }
        "N" => {
            let categories = first(Nominal)?.map(Column::to_strings).unwrap_or_default();
            let c = categories.clone();
            attempts.push((ChartKind::Pie, Box::new(move || charts::pie_counts(&c, options))));
            attempts.push((ChartKind::List, Box::new(move || charts::table_list(&categories, options))));
        }
        "NQ" => {
            let categories = first(Nominal)?.map(Column::to_strings).unwrap_or_default();
            let values = first(Quantitative)?.map(Column::to_f64).transpose()?.unwrap_or_default();
            let (c, v) = (categories.clone(), values.clone());
            attempts.push((ChartKind::Bar, Box::new(move || charts::bar(&c, &v, Orientation::Vertical, options))));
            let (c, v) = (categories.clone(), values.clone());
            attempts.push((ChartKind::Scatter, Box::new(move || {
                let data = ScatterData::Values {
                    categories: &c,
                    values: &v,
                };
                charts::scatter(&data, None, options)
            })));
            let (c, v) = (categories.clone(), nested(&values));
            attempts.push((ChartKind::Heatmap, Box::new(move || {
                charts::heatmap(&c, Some(v.as_slice()), None, None, HeatmapMode::Values, options)
            })));
            attempts.push((ChartKind::Pie, Box::new(move || charts::pie(&categories, &values, options))));
        }
        "NTT" | "NOTT" | "NQTT" => {
            let (start, end) = interval_columns(&selected)?;
            let category = first(Nominal)?.ok_or_else(|| ChartError::Validation("No nominal column to group by".into()))?;
            let value = match profiled.code.as_str() {
                "NOTT" => first(Ordinal)?,
                "NQTT" => first(Quantitative)?,
                _ => None,
            };
            let columns = selected.columns();
            let iv = Intervals::from_columns(category, &columns[start], &columns[end], value)?;
            attempts.extend(interval_attempts(iv, options));
        }
        _ => {
            log::warn!("No suitable plot type found for the columns or data types.");
            return Ok(Vec::new());
        }
    }

    let mut figures = Vec::new();
    for (kind, attempt) in attempts {
        match attempt() {
            Ok(figure) => figures.push((kind, figure)),
            Err(e) => log::warn!("Skipping {} chart: {}", kind, e),
        }
    }
    Ok(figures)
}

fn interval_attempts(iv: Intervals, options: &ChartOptions) -> Vec<Attempt<'_>> {
    let iv = std::rc::Rc::new(iv);
    let with_values = iv.values.is_some();
    let mut attempts: Vec<Attempt> = Vec::new();

    let data = iv.clone();
    attempts.push((ChartKind::Gantt, Box::new(move || charts::gantt(&data.categories, &data.starts, &data.ends, options))));
    if !with_values {
        let data = iv.clone();
        attempts.push((ChartKind::Pie, Box::new(move || {
            charts::pie_intervals(&data.categories, &data.starts, &data.ends, options)
        })));
    }
    let data = iv.clone();
    attempts.push((ChartKind::Line, Box::new(move || charts::line(&data.series(), None, options))));
    let data = iv.clone();
    let scatter: Attempt = (ChartKind::Scatter, Box::new(move || {
        charts::scatter(&ScatterData::Intervals(data.series()), None, options)
    }));
    let heatmap: Attempt = (ChartKind::Heatmap, Box::new(move || {
        let values = iv.values.as_deref().map(nested);
        charts::heatmap(
            &iv.categories,
            values.as_deref(),
            Some(iv.starts.as_slice()),
            Some(iv.ends.as_slice()),
            HeatmapMode::Intervals,
            options,
        )
    }));
    if with_values {
        attempts.extend([heatmap, scatter]);
    } else {
        attempts.extend([scatter, heatmap]);
    }
    attempts
}
