// Typed in-memory table and CSV loading

use crate::error::{ChartError, Result};
use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Values of a single column. All variants hold one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
    DateTime(Vec<NaiveDateTime>),
    /// Ordered categorical: every value is one of `levels`, which are listed low to high
    Ordered { values: Vec<String>, levels: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column { name: name.into(), data }
    }

    pub fn ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        Column::new(name, ColumnData::Int(values))
    }

    pub fn floats(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column::new(name, ColumnData::Float(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Column::new(name, ColumnData::Text(values.into_iter().map(Into::into).collect()))
    }

    pub fn datetimes(name: impl Into<String>, values: Vec<NaiveDateTime>) -> Self {
        Column::new(name, ColumnData::DateTime(values))
    }

    /// Build an ordered categorical column; every value must appear in `levels`.
    pub fn ordered<S: Into<String>>(
        name: impl Into<String>,
        values: Vec<S>,
        levels: Vec<S>,
    ) -> Result<Self> {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        if let Some(bad) = values.iter().find(|v| !levels.contains(*v)) {
            return Err(ChartError::Validation(format!(
                "value '{}' in column '{}' is not one of the levels [{}]",
                bad,
                name,
                levels.join(", ")
            )));
        }
        Ok(Column::new(name, ColumnData::Ordered { values, levels }))
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Ordered { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Int(_) | ColumnData::Float(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self.data, ColumnData::DateTime(_))
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self.data, ColumnData::Ordered { .. })
    }

    /// Number of distinct values in the column
    pub fn distinct_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.iter().collect::<HashSet<_>>().len(),
            // -0.0 and 0.0 count as one value
            ColumnData::Float(v) => v
                .iter()
                .map(|x| if *x == 0.0 { 0u64 } else { x.to_bits() })
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Text(v) => v.iter().collect::<HashSet<_>>().len(),
            ColumnData::DateTime(v) => v.iter().collect::<HashSet<_>>().len(),
            ColumnData::Ordered { values, .. } => values.iter().collect::<HashSet<_>>().len(),
        }
    }

    /// Numeric view of the column. Ordered categoricals map to their level rank.
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        match &self.data {
            ColumnData::Int(v) => Ok(v.iter().map(|x| *x as f64).collect()),
            ColumnData::Float(v) => Ok(v.clone()),
            ColumnData::Ordered { values, levels } => Ok(values
                .iter()
                .map(|v| levels.iter().position(|l| l == v).unwrap_or(0) as f64)
                .collect()),
            _ => Err(ChartError::ColumnType {
                name: self.name.clone(),
                expected: "numeric",
            }),
        }
    }

    pub fn to_datetimes(&self) -> Result<Vec<NaiveDateTime>> {
        match &self.data {
            ColumnData::DateTime(v) => Ok(v.clone()),
            _ => Err(ChartError::ColumnType {
                name: self.name.clone(),
                expected: "date/time",
            }),
        }
    }

    /// Every value rendered as a label
    pub fn to_strings(&self) -> Vec<String> {
        match &self.data {
            ColumnData::Int(v) => v.iter().map(|x| x.to_string()).collect(),
            ColumnData::Float(v) => v.iter().map(|x| x.to_string()).collect(),
            ColumnData::Text(v) => v.clone(),
            ColumnData::DateTime(v) => v.iter().map(|d| d.to_string()).collect(),
            ColumnData::Ordered { values, .. } => values.clone(),
        }
    }
}

/// Column reference by position or (case-insensitive) header name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

pub fn parse_column_selector(input: &str) -> ColumnSelector {
    match input.parse::<usize>() {
        Ok(index) => ColumnSelector::Index(index),
        Err(_) => ColumnSelector::Name(input.to_string()),
    }
}

/// Column-oriented table; every column has the same number of rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let lengths: Vec<(&str, usize)> =
            columns.iter().map(|c| (c.name.as_str(), c.len())).collect();
        crate::error::ensure_same_len(&lengths)?;
        Ok(Table { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// A table with no columns or no rows
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, selector: &ColumnSelector) -> Result<&Column> {
        match selector {
            ColumnSelector::Index(idx) => self.columns.get(*idx).ok_or_else(|| {
                ChartError::Validation(format!(
                    "Column index {} out of bounds (available columns: {})",
                    idx,
                    self.columns.len()
                ))
            }),
            ColumnSelector::Name(name) => self
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| ChartError::ColumnNotFound {
                    name: name.clone(),
                    available: self.headers().join(", "),
                }),
        }
    }

    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        self.column(&ColumnSelector::Name(name.to_string()))
    }

    /// New table holding the selected columns, in selection order
    pub fn select(&self, selectors: &[ColumnSelector]) -> Result<Table> {
        let columns = selectors
            .iter()
            .map(|s| self.column(s).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Table { columns })
    }

    /// Convert a text column into an ordered categorical with the given levels.
    pub fn set_ordered(&mut self, name: &str, levels: Vec<String>) -> Result<()> {
        let available = self.headers().join(", ");
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ChartError::ColumnNotFound {
                name: name.to_string(),
                available,
            })?;
        let values = column.to_strings();
        *column = Column::ordered(column.name.clone(), values, levels)?;
        Ok(())
    }
}

pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Pick the narrowest column kind that every cell parses as.
fn infer_column(name: String, cells: Vec<String>) -> Column {
    if let Some(ints) = cells.iter().map(|s| s.trim().parse::<i64>().ok()).collect::<Option<Vec<_>>>() {
        return Column::ints(name, ints);
    }
    if let Some(floats) = cells.iter().map(|s| s.trim().parse::<f64>().ok()).collect::<Option<Vec<_>>>() {
        return Column::floats(name, floats);
    }
    if let Some(dates) = cells.iter().map(|s| parse_datetime(s)).collect::<Option<Vec<_>>>() {
        return Column::datetimes(name, dates);
    }
    Column::text(name, cells)
}

pub fn read_csv<R: io::Read>(reader: R) -> anyhow::Result<Table> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        for (i, value) in record.iter().enumerate() {
            if let Some(col) = cells.get_mut(i) {
                col.push(value.to_string());
            }
        }
    }

    if cells.first().map(|c| c.is_empty()).unwrap_or(true) {
        return Err(anyhow!("CSV must contain at least one data row"));
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, col)| infer_column(name, col))
        .collect();
    Ok(Table::new(columns)?)
}

pub fn read_csv_from_stdin() -> anyhow::Result<Table> {
    read_csv(io::stdin())
}
