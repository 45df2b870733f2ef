//! Application state and event handling.
//!
//! [`App`] owns the loaded dataset, the symbol selection, and the live chart
//! registry. A front end turns user actions into [`UiEvent`]s and passes
//! them to [`App::handle`] together with its [`ChartRenderer`].
//!
//! Ingestion failures never reach the renderer: they are logged, the
//! previous state is kept, and [`Outcome::Failed`] is returned.

use crate::charts::{default_groups, MetricGroup};
use crate::data::{load_csv, parse_csv_str, DataConfig};
use crate::error::Result;
use crate::projection::{project, ProjectionOptions};
use crate::remote::{load_remote, RemoteSource};
use crate::render::{ChartRegistry, ChartRenderer};
use crate::symbols::SymbolSelector;
use crate::types::Dataset;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A local file was picked.
    FileSelected(PathBuf),
    /// CSV text arrived from elsewhere (an upload body).
    TextLoaded { source: String, text: String },
    /// The "load remote" trigger was pressed.
    RemoteLoadRequested,
    /// A symbol was chosen in the dropdown.
    SymbolChanged(String),
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A dataset replaced the previous one.
    Loaded { symbols: Vec<String> },
    /// Charts were redrawn for a symbol.
    Rendered { symbol: String, charts: usize },
    /// Nothing changed on screen.
    Unchanged,
    /// Ingestion failed; previous state kept.
    Failed(String),
}

/// Identifies one load request; only the newest may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Settings fixed for the life of the app.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub data: DataConfig,
    pub projection: ProjectionOptions,
    pub remote: RemoteSource,
    pub groups: Vec<MetricGroup>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            projection: ProjectionOptions::default(),
            remote: RemoteSource::default(),
            groups: default_groups(),
        }
    }
}

/// Application state: dataset, selection, and live charts.
#[derive(Debug, Default)]
pub struct App {
    settings: AppSettings,
    dataset: Option<Dataset>,
    selector: SymbolSelector,
    registry: ChartRegistry,
    latest_ticket: u64,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn selector(&self) -> &SymbolSelector {
        &self.selector
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Dispatch one event.
    ///
    /// Errors are only returned for rendering failures; ingestion failures
    /// come back as [`Outcome::Failed`].
    pub fn handle<R: ChartRenderer + ?Sized>(
        &mut self,
        event: UiEvent,
        renderer: &mut R,
    ) -> Result<Outcome> {
        debug!("Handling event: {:?}", event);
        match event {
            UiEvent::FileSelected(path) => {
                let ticket = self.begin_load();
                let loaded = load_csv(&path, &self.settings.data);
                self.complete_load(ticket, loaded, renderer)
            }
            UiEvent::TextLoaded { source, text } => {
                let ticket = self.begin_load();
                let loaded = parse_csv_str(&text, &source, &self.settings.data);
                self.complete_load(ticket, loaded, renderer)
            }
            UiEvent::RemoteLoadRequested => {
                let ticket = self.begin_load();
                let loaded = load_remote(&self.settings.remote, &self.settings.data);
                self.complete_load(ticket, loaded, renderer)
            }
            UiEvent::SymbolChanged(symbol) => {
                self.selector.select(symbol);
                self.render_selection(renderer)
            }
        }
    }

    /// Start a load; the returned ticket must be passed to [`App::complete_load`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        LoadTicket(self.latest_ticket)
    }

    /// Finish a load started with [`App::begin_load`].
    ///
    /// Results of superseded loads are dropped. A successful load replaces
    /// the dataset, resets the selection to the first symbol, and renders.
    pub fn complete_load<R: ChartRenderer + ?Sized>(
        &mut self,
        ticket: LoadTicket,
        loaded: Result<Dataset>,
        renderer: &mut R,
    ) -> Result<Outcome> {
        if ticket.0 != self.latest_ticket {
            warn!(
                "Discarding load {} superseded by load {}",
                ticket.0, self.latest_ticket
            );
            return Ok(Outcome::Unchanged);
        }

        let dataset = match loaded {
            Ok(ds) => ds,
            Err(e) => {
                error!("Failed to load data: {}", e);
                return Ok(Outcome::Failed(e.to_string()));
            }
        };

        self.selector = SymbolSelector::from_dataset(&dataset);
        let symbols = self.selector.options().to_vec();
        info!(
            "Loaded {} rows and {} symbols from {}",
            dataset.len(),
            symbols.len(),
            dataset.source
        );
        self.dataset = Some(dataset);

        if !self.selector.is_empty() {
            self.render_selection(renderer)?;
        }
        Ok(Outcome::Loaded { symbols })
    }

    /// Redraw charts for the current selection.
    ///
    /// With no matching rows nothing is drawn and the previous charts stay.
    pub fn render_selection<R: ChartRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
    ) -> Result<Outcome> {
        let (Some(dataset), Some(symbol)) = (self.dataset.as_ref(), self.selector.selected())
        else {
            return Ok(Outcome::Unchanged);
        };

        let Some(series) = project(dataset, symbol, &self.settings.projection) else {
            debug!("No rows for '{}', keeping current charts", symbol);
            return Ok(Outcome::Unchanged);
        };

        let symbol = symbol.to_string();
        match self
            .registry
            .dispatch(renderer, &self.settings.groups, &series)
        {
            Ok(charts) => Ok(Outcome::Rendered { symbol, charts }),
            Err(e) => {
                error!("Failed to render charts for '{}': {}", symbol, e);
                Err(e)
            }
        }
    }

    /// Dispose of every live chart.
    pub fn clear_charts<R: ChartRenderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        self.registry.reset(renderer)
    }
}
