//! Symbol extraction and the current selection.

use crate::types::Dataset;
use std::collections::HashSet;
use tracing::debug;

/// Distinct values of the symbol column, in first-seen order.
///
/// Rows without a symbol cell, or with an empty one, are ignored.
pub fn distinct_symbols(dataset: &Dataset) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for row in &dataset.rows {
        match row.symbol() {
            Some(symbol) if !symbol.is_empty() => {
                if seen.insert(symbol) {
                    symbols.push(symbol.to_string());
                }
            }
            _ => {}
        }
    }

    debug!("Found {} distinct symbols", symbols.len());
    symbols
}

/// The symbol dropdown: available options plus the chosen one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSelector {
    options: Vec<String>,
    selected: Option<String>,
}

impl SymbolSelector {
    /// Populate from a freshly loaded dataset, selecting the first symbol.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::from_options(distinct_symbols(dataset))
    }

    pub fn from_options(options: Vec<String>) -> Self {
        let selected = options.first().cloned();
        Self { options, selected }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Change the selection.
    ///
    /// Any value is accepted; a symbol outside the options simply matches
    /// no rows later on.
    pub fn select(&mut self, symbol: impl Into<String>) {
        self.selected = Some(symbol.into());
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.options.iter().any(|s| s == symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
