//! Column type profiling and default chart suggestions.
//!
//! Each profiled column gets one of four measurement-level tags. The tags of
//! the profiled columns are sorted and joined into a type code ("NQ", "NTT")
//! which keys a fixed table of suggested chart names.

use crate::error::{ChartError, Result};
use crate::table::{Column, Table};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Distinct/rows ratio above which a numeric column counts as quantitative
pub const QUANTITATIVE_RATIO: f64 = 0.1;
/// Numeric columns with at most this many distinct values count as ordinal
pub const ORDINAL_MAX_DISTINCT: usize = 10;
/// Returned when the type code has no entry in the suggestion table
pub const NO_CHART_FOUND: &str = "No appropriate chart found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

impl TypeTag {
    pub fn code(self) -> char {
        match self {
            TypeTag::Nominal => 'N',
            TypeTag::Ordinal => 'O',
            TypeTag::Quantitative => 'Q',
            TypeTag::Temporal => 'T',
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

type Rule = fn(&Column) -> bool;

fn is_temporal(column: &Column) -> bool {
    column.is_temporal()
}

fn is_quantitative(column: &Column) -> bool {
    column.is_numeric()
        && (column.distinct_count() as f64 / column.len() as f64) > QUANTITATIVE_RATIO
}

fn is_ordered_categorical(column: &Column) -> bool {
    column.is_ordered()
}

fn is_low_cardinality_numeric(column: &Column) -> bool {
    column.is_numeric() && column.distinct_count() <= ORDINAL_MAX_DISTINCT
}

/// Classification rules, evaluated top to bottom; the first match wins.
/// Columns matching none are nominal.
const RULES: &[(Rule, TypeTag)] = &[
    (is_temporal, TypeTag::Temporal),
    (is_quantitative, TypeTag::Quantitative),
    (is_ordered_categorical, TypeTag::Ordinal),
    (is_low_cardinality_numeric, TypeTag::Ordinal),
];

/// Classify a single, non-empty column.
pub fn infer_type(column: &Column) -> TypeTag {
    RULES
        .iter()
        .find(|(rule, _)| rule(column))
        .map(|(_, tag)| *tag)
        .unwrap_or(TypeTag::Nominal)
}

const TIME_SERIES_CHARTS: &[&str] = &["Gantt", "Line", "Heatmap", "Scatter"];

static SUGGESTED_CHARTS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("Q", &["Histogram"][..]),
        ("N", &["List (Table)", "Pie"][..]),
        ("NQ", &["Bar", "Scatter", "Heatmap", "Table", "Pie"][..]),
        ("NT", &["Gantt", "Pie", "Line", "Scatter", "Heatmap"][..]),
        ("NOT", TIME_SERIES_CHARTS),
        ("NQT", TIME_SERIES_CHARTS),
    ])
});

/// Suggested charts for a type code. Unknown codes yield the sentinel list.
pub fn suggest_charts(code: &str) -> Vec<&'static str> {
    SUGGESTED_CHARTS
        .get(code)
        .map(|charts| charts.to_vec())
        .unwrap_or_else(|| vec![NO_CHART_FOUND])
}

/// Sorted concatenation of tag codes
pub fn type_code<I: IntoIterator<Item = TypeTag>>(tags: I) -> String {
    let mut codes: Vec<char> = tags.into_iter().map(TypeTag::code).collect();
    codes.sort_unstable();
    codes.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Column name and tag, in table order
    pub columns: Vec<(String, TypeTag)>,
    pub code: String,
    pub suggestions: Vec<&'static str>,
}

impl Profile {
    pub fn tag_of(&self, name: &str) -> Option<TypeTag> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    /// First profiled column carrying `tag`
    pub fn first_with(&self, tag: TypeTag) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(n, _)| n.as_str())
    }
}

/// Profile the first `col_count` columns of `table`.
pub fn profile(table: &Table, col_count: usize) -> Result<Profile> {
    if table.is_empty() {
        return Err(ChartError::EmptyTable);
    }
    if table.n_cols() < col_count {
        return Err(ChartError::NotEnoughColumns {
            required: col_count,
            found: table.n_cols(),
        });
    }

    let columns: Vec<(String, TypeTag)> = table
        .columns()
        .iter()
        .take(col_count)
        .map(|c| (c.name.clone(), infer_type(c)))
        .collect();
    let code = type_code(columns.iter().map(|(_, t)| *t));
    let suggestions = suggest_charts(&code);
    log::debug!("profiled columns {:?} as {}", columns, code);

    Ok(Profile {
        columns,
        code,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn clinic_table() -> Table {
        Table::new(vec![
            Column::ints("blood_pressure", vec![120, 130, 125]),
            Column::text("condition", vec!["Diabetes", "Hypertension", "Asthma"]),
            Column::datetimes(
                "visit_date",
                vec![date(2021, 1, 1), date(2021, 1, 2), date(2021, 1, 3)],
            ),
            Column::ordered(
                "pain_scale",
                vec!["low", "high", "medium"],
                vec!["low", "medium", "high"],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_integer_high_ratio_is_quantitative() {
        let col = Column::ints("v", (0..50).collect());
        assert_eq!(infer_type(&col), TypeTag::Quantitative);
    }

    #[test]
    fn test_integer_few_distinct_low_ratio_is_ordinal() {
        // 5 distinct values over 100 rows: ratio 0.05
        let col = Column::ints("v", (0..100).map(|i| i % 5).collect());
        assert_eq!(infer_type(&col), TypeTag::Ordinal);
    }

    #[test]
    fn test_small_numeric_column_prefers_quantitative() {
        // 3 distinct of 3 rows: ratio 1.0 beats the ordinal rule
        let col = Column::floats("v", vec![1.0, 2.0, 3.0]);
        assert_eq!(infer_type(&col), TypeTag::Quantitative);
    }

    #[test]
    fn test_many_distinct_low_ratio_is_nominal() {
        // 20 distinct values over 1000 rows: not Q (0.02), not O (>10)
        let col = Column::ints("v", (0..1000).map(|i| i % 20).collect());
        assert_eq!(infer_type(&col), TypeTag::Nominal);
    }

    #[test]
    fn test_text_and_temporal_and_ordered() {
        let table = clinic_table();
        let cols = table.columns();
        assert_eq!(infer_type(&cols[1]), TypeTag::Nominal);
        assert_eq!(infer_type(&cols[2]), TypeTag::Temporal);
        assert_eq!(infer_type(&cols[3]), TypeTag::Ordinal);
    }

    #[test]
    fn test_profile_code_is_sorted() {
        let table = clinic_table();
        let profile = profile(&table, 3).unwrap();
        assert_eq!(profile.code, "NQT");
        assert_eq!(profile.suggestions, vec!["Gantt", "Line", "Heatmap", "Scatter"]);
        assert_eq!(profile.tag_of("visit_date"), Some(TypeTag::Temporal));
        assert_eq!(profile.first_with(TypeTag::Nominal), Some("condition"));
    }

    #[test]
    fn test_profile_is_deterministic() {
        let table = clinic_table();
        let a = profile(&table, 4).unwrap();
        let b = profile(&table, 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.code, "NOQT");
    }

    #[test]
    fn test_unknown_code_returns_sentinel() {
        assert_eq!(suggest_charts("NOQT"), vec![NO_CHART_FOUND]);
        assert_eq!(suggest_charts(""), vec![NO_CHART_FOUND]);
        assert_eq!(suggest_charts("NQ"), vec!["Bar", "Scatter", "Heatmap", "Table", "Pie"]);
    }

    #[test]
    fn test_profile_empty_table() {
        let table = Table::new(vec![Column::ints("v", vec![])]).unwrap();
        assert!(matches!(profile(&table, 1), Err(ChartError::EmptyTable)));
        assert!(matches!(
            profile(&Table::default(), 0),
            Err(ChartError::EmptyTable)
        ));
    }

    #[test]
    fn test_profile_not_enough_columns() {
        let table = Table::new(vec![Column::ints("v", vec![1, 2])]).unwrap();
        let err = profile(&table, 3).unwrap_err();
        assert!(err.to_string().contains("at least 3 columns"));
    }

    #[test]
    fn test_type_code_sorting() {
        assert_eq!(
            type_code([TypeTag::Temporal, TypeTag::Nominal, TypeTag::Temporal]),
            "NTT"
        );
    }
}
