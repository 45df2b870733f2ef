//! Projection of a dataset onto one symbol.
//!
//! Filtering is an exact, case-sensitive match on the symbol column. Numeric
//! columns are parsed into [`Observation`]s so a missing or malformed cell
//! stays visibly missing instead of turning into a number.

use crate::data::parse_date;
use crate::types::{Column, Dataset, Observation, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Options controlling how rows are projected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    /// Order rows by business date instead of trusting file order.
    pub sort_by_date: bool,
    /// Explicit business date format, tried before the built-in formats.
    pub date_format: Option<String>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            sort_by_date: true,
            date_format: None,
        }
    }
}

/// Rows whose symbol equals `symbol`, in file order.
pub fn filter_rows<'a>(dataset: &'a Dataset, symbol: &str) -> Vec<&'a Row> {
    dataset
        .rows
        .iter()
        .filter(|row| row.symbol() == Some(symbol))
        .collect()
}

/// Parse a cell as a locale-agnostic decimal.
///
/// Returns `None` for empty cells, thousands separators, trailing text, and
/// non-finite values such as `NaN` or `inf`.
pub fn parse_number(cell: &str) -> Observation {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extract one numeric column from a set of rows.
pub fn extract_column(rows: &[&Row], column: Column) -> Vec<Observation> {
    rows.iter()
        .map(|row| row.value(column).and_then(parse_number))
        .collect()
}

/// Every series of one symbol, aligned with its date labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySeries {
    pub symbol: String,
    /// Business dates as written in the file; empty when the cell is absent.
    pub labels: Vec<String>,
    columns: BTreeMap<Column, Vec<Observation>>,
}

impl CompanySeries {
    /// Observations of a numeric column, one per label.
    pub fn series(&self, column: Column) -> &[Observation] {
        self.columns
            .get(&column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of rows (points per series).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of missing observations in a column.
    pub fn missing_count(&self, column: Column) -> usize {
        self.series(column).iter().filter(|v| v.is_none()).count()
    }
}

/// Project the dataset onto `symbol`.
///
/// Returns `None` when no row matches.
pub fn project(
    dataset: &Dataset,
    symbol: &str,
    options: &ProjectionOptions,
) -> Option<CompanySeries> {
    let mut rows = filter_rows(dataset, symbol);
    if rows.is_empty() {
        debug!("No rows match symbol '{}'", symbol);
        return None;
    }

    if options.sort_by_date {
        sort_by_business_date(&mut rows, options.date_format.as_deref());
    }

    let labels = rows
        .iter()
        .map(|row| row.value(Column::BusinessDate).unwrap_or_default().to_string())
        .collect();

    let columns = Column::NUMERIC
        .iter()
        .map(|&column| (column, extract_column(&rows, column)))
        .collect();

    debug!("Projected {} rows for '{}'", rows.len(), symbol);

    Some(CompanySeries {
        symbol: symbol.to_string(),
        labels,
        columns,
    })
}

/// Stable sort by parsed business date; undated rows keep their order at the end.
fn sort_by_business_date(rows: &mut Vec<&Row>, format: Option<&str>) {
    let mut keyed: Vec<_> = rows
        .iter()
        .map(|row| {
            let date = row
                .value(Column::BusinessDate)
                .and_then(|s| parse_date(s, format).ok());
            (date, *row)
        })
        .collect();

    let undated = keyed.iter().filter(|(d, _)| d.is_none()).count();
    if undated > 0 {
        warn!("{} rows have no parseable business date", undated);
    }

    keyed.sort_by_key(|(date, _)| (date.is_none(), *date));
    *rows = keyed.into_iter().map(|(_, row)| row).collect();
}
