//! Stockview - per-symbol charts from daily stock CSV exports.
//!
//! # Overview
//!
//! Stockview loads a CSV of daily stock records, either from a local file or
//! from a remote bucket, lets you pick one company symbol, and renders a set
//! of time-series charts for it:
//!
//! - **Ingestion**: header-aware CSV parsing into untyped rows
//! - **Selection**: distinct symbols in first-seen order, first one selected
//! - **Projection**: exact symbol filter, date ordering, typed numeric series
//!   where a missing cell stays missing
//! - **Charts**: declarative Chart.js-shaped configs, drawn as SVG, HTML, or
//!   exported as JSON
//! - **Lifecycle**: previous charts are disposed before new ones are drawn
//!
//! # Quick Start
//!
//! ```no_run
//! use stockview::app::{App, UiEvent};
//! use stockview::render::SvgRenderer;
//!
//! let mut app = App::default();
//! let mut renderer = SvgRenderer::new("charts");
//!
//! app.handle(UiEvent::FileSelected("data/stock-data.csv".into()), &mut renderer)
//!     .unwrap();
//! app.handle(UiEvent::SymbolChanged("NABIL".to_string()), &mut renderer)
//!     .unwrap();
//! ```
//!
//! # Modules
//!
//! - [`types`]: Rows, datasets, and recognized columns
//! - [`data`]: CSV ingestion
//! - [`remote`]: Remote CSV retrieval
//! - [`symbols`]: Symbol extraction and selection
//! - [`projection`]: Filtering and numeric extraction
//! - [`charts`]: Metric groups and chart configurations
//! - [`render`]: Renderers and chart lifecycle
//! - [`export`]: HTML and JSON export
//! - [`viz`]: Terminal summaries
//! - [`app`]: Application state and event handling
//! - [`config`]: TOML configuration file support

pub mod app;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod projection;
pub mod remote;
pub mod render;
pub mod symbols;
pub mod types;
pub mod viz;

// Re-exports for convenience
pub use app::{App, AppSettings, Outcome, UiEvent};
pub use charts::{build_chart, build_charts, default_groups, ChartConfig, ChartKind, MetricGroup};
pub use data::{load_csv, parse_csv_str, DataConfig};
pub use error::{Result, ViewerError};
pub use projection::{extract_column, filter_rows, parse_number, project, CompanySeries};
pub use remote::{fetch_csv_text, load_remote, RemoteSource};
pub use render::{ChartHandle, ChartRegistry, ChartRenderer, MemoryRenderer, SvgRenderer};
pub use symbols::{distinct_symbols, SymbolSelector};
pub use types::{Column, Dataset, Observation, Row};
