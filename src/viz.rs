//! Terminal-friendly views of a projected selection.
//!
//! - ASCII sparklines for a quick look at a series
//! - A per-column summary table of one symbol, drawn with `tabled`
//!
//! # Example
//!
//! ```ignore
//! use stockview::viz::{series_sparkline, selection_summary};
//!
//! let spark = series_sparkline(series.series(Column::ClosePrice), 40);
//! println!("Close: {}", spark);
//! println!("{}", selection_summary(&series, 30));
//! ```

use crate::projection::CompanySeries;
use crate::types::{Column, Observation};
use std::fmt::Write;
use tabled::{builder::Builder, settings::Style};

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Glyph for `value` on a `lo..=hi` scale; a flat scale sits mid-height.
fn glyph(value: f64, lo: f64, hi: f64) -> char {
    let level = if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    SPARKLINE_CHARS[((level * 7.0).round() as usize).min(7)]
}

/// ASCII sparkline of at most `width` characters, scaled to the data.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let points = downsample(values, width);
    let lo = points.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    points.iter().map(|&v| glyph(v, lo, hi)).collect()
}

/// Sparkline of observations; missing values are left out.
pub fn series_sparkline(values: &[Observation], width: usize) -> String {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    sparkline(&present, width)
}

/// Downsample a slice of values to a target length using averaging.
fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    if values.len() <= target_len {
        return values.to_vec();
    }

    let chunk_size = values.len() as f64 / target_len as f64;
    let mut result = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let start = (i as f64 * chunk_size).floor() as usize;
        let end = ((i + 1) as f64 * chunk_size).ceil() as usize;
        let end = end.min(values.len());

        if start < end {
            let sum: f64 = values[start..end].iter().sum();
            result.push(sum / (end - start) as f64);
        }
    }

    result
}

/// Statistics of one column of a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: Column,
    pub present: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub last: Option<f64>,
}

impl ColumnStats {
    pub fn from_series(column: Column, values: &[Observation]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        Self {
            column,
            present: present.len(),
            missing: values.len() - present.len(),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
            last: values.last().copied().flatten(),
        }
    }
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Per-column summary table of a selection.
pub fn selection_summary(series: &CompanySeries, spark_width: usize) -> String {
    let mut out = String::new();

    let first = series.labels.first().map(String::as_str).unwrap_or("-");
    let last = series.labels.last().map(String::as_str).unwrap_or("-");
    let _ = writeln!(out, "Symbol: {}", series.symbol);
    let _ = writeln!(out, "Rows:   {} ({} to {})", series.len(), first, last);

    let mut builder = Builder::new();
    builder.push_record(["Column", "Count", "Missing", "Min", "Max", "Last", "Trend"]);

    for column in Column::NUMERIC {
        let values = series.series(column);
        let stats = ColumnStats::from_series(column, values);
        builder.push_record([
            column.header().to_string(),
            stats.present.to_string(),
            stats.missing.to_string(),
            format_opt(stats.min),
            format_opt(stats.max),
            format_opt(stats.last),
            series_sparkline(values, spark_width),
        ]);
    }

    let table = builder.build().with(Style::rounded()).to_string();
    let _ = writeln!(out, "{}", table);
    out
}
