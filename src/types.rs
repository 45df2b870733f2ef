//! Core data types for stock records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single extracted numeric cell.
///
/// `Some(value)` when the cell held a well-formed decimal, `None` when the
/// cell was absent, empty, or not a number.
pub type Observation = Option<f64>;

/// Recognized columns of the daily stock CSV.
///
/// Header names are matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Column {
    Symbol,
    BusinessDate,
    OpenPrice,
    HighPrice,
    LowPrice,
    ClosePrice,
    TotalTradedQuantity,
    MarketCapitalization,
    FiftyTwoWeeksHigh,
    FiftyTwoWeeksLow,
    AverageTradedPrice,
    PreviousDayClosePrice,
    TotalTrades,
    LastUpdatedPrice,
}

impl Column {
    /// Every recognized column, in header order of the reference export.
    pub const ALL: [Column; 14] = [
        Column::Symbol,
        Column::BusinessDate,
        Column::OpenPrice,
        Column::HighPrice,
        Column::LowPrice,
        Column::ClosePrice,
        Column::TotalTradedQuantity,
        Column::MarketCapitalization,
        Column::FiftyTwoWeeksHigh,
        Column::FiftyTwoWeeksLow,
        Column::AverageTradedPrice,
        Column::PreviousDayClosePrice,
        Column::TotalTrades,
        Column::LastUpdatedPrice,
    ];

    /// Columns holding numbers (everything except the symbol and date).
    pub const NUMERIC: [Column; 12] = [
        Column::OpenPrice,
        Column::HighPrice,
        Column::LowPrice,
        Column::ClosePrice,
        Column::TotalTradedQuantity,
        Column::MarketCapitalization,
        Column::FiftyTwoWeeksHigh,
        Column::FiftyTwoWeeksLow,
        Column::AverageTradedPrice,
        Column::PreviousDayClosePrice,
        Column::TotalTrades,
        Column::LastUpdatedPrice,
    ];

    /// Exact CSV header name.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Symbol => "SYMBOL",
            Column::BusinessDate => "BUSINESS_DATE",
            Column::OpenPrice => "OPEN_PRICE",
            Column::HighPrice => "HIGH_PRICE",
            Column::LowPrice => "LOW_PRICE",
            Column::ClosePrice => "CLOSE_PRICE",
            Column::TotalTradedQuantity => "TOTAL_TRADED_QUANTITY",
            Column::MarketCapitalization => "MARKET_CAPITALIZATION",
            Column::FiftyTwoWeeksHigh => "FIFTY_TWO_WEEKS_HIGH",
            Column::FiftyTwoWeeksLow => "FIFTY_TWO_WEEKS_LOW",
            Column::AverageTradedPrice => "AVERAGE_TRADED_PRICE",
            Column::PreviousDayClosePrice => "PREVIOUS_DAY_CLOSE_PRICE",
            Column::TotalTrades => "TOTAL_TRADES",
            Column::LastUpdatedPrice => "LAST_UPDATED_PRICE",
        }
    }

    /// Look up a column by its exact header name.
    pub fn from_header(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.header() == name)
    }

    /// Whether this column holds numeric values.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Column::Symbol | Column::BusinessDate)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::from_header(s).ok_or_else(|| format!("Unknown column: {}", s))
    }
}

/// One CSV record: ordered cells keyed by column name.
///
/// Values are kept exactly as read; nothing is coerced to a number here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    ///
    /// Pairs with an empty column name are ignored, and a repeated name keeps
    /// its first value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.insert(k, v);
        }
        row
    }

    /// Add a cell. Returns false if the name is empty or already present.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> bool {
        let column = column.into();
        if column.is_empty() || self.get(&column).is_some() {
            return false;
        }
        self.cells.push((column, value.into()));
        true
    }

    /// Raw value of a cell by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Raw value of a recognized column.
    pub fn value(&self, column: Column) -> Option<&str> {
        self.get(column.header())
    }

    /// The symbol cell, if present.
    pub fn symbol(&self) -> Option<&str> {
        self.value(Column::Symbol)
    }

    /// Iterate over `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Every row of one loaded CSV, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Where the data came from (file path or URL).
    pub source: String,
    /// Header names, non-empty and unique.
    pub headers: Vec<String>,
    /// Records in file order.
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the header row contains a column.
    pub fn has_column(&self, column: Column) -> bool {
        self.headers.iter().any(|h| h == column.header())
    }

    /// Recognized columns that are absent from the header.
    pub fn missing_columns(&self) -> Vec<Column> {
        Column::ALL
            .iter()
            .copied()
            .filter(|c| !self.has_column(*c))
            .collect()
    }
}
