//! Command-line interface for the stock chart viewer.

use stockview::charts::ChartConfig;
use stockview::config::{RenderFormat, ViewerFileConfig};
use stockview::data::{load_csv, DataConfig};
use stockview::error::{Result, ViewerError};
use stockview::export::{export_html, export_json, file_stem};
use stockview::projection::{project, CompanySeries, ProjectionOptions};
use stockview::remote::{load_remote, RemoteSource};
use stockview::render::{ChartRegistry, MemoryRenderer, SvgRenderer};
use stockview::symbols::distinct_symbols;
use stockview::types::{Column, Dataset};
use stockview::viz::selection_summary;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Stockview - per-symbol charts from daily stock CSV exports.
#[derive(Parser)]
#[command(name = "stockview")]
#[command(author = "Johan")]
#[command(version)]
#[command(about = "Load a daily stock CSV and chart one company")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format for listings and summaries
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to read the CSV from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to a local CSV file
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Fetch the CSV from the remote bucket
    #[arg(long, conflicts_with = "data")]
    pub remote: bool,

    /// Remote URL (implies --remote)
    #[arg(long, conflicts_with = "data")]
    pub url: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV delimiter (auto-detected by default)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Keep file order instead of sorting rows by business date
    #[arg(long)]
    pub no_sort: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the distinct symbols in a dataset
    Symbols {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render charts for one symbol
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Symbol to chart (defaults to the first one)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print a per-column summary of one symbol
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Symbol to summarize (defaults to the first one)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Sparkline width
        #[arg(long, default_value = "30")]
        width: usize,
    },

    /// Validate a data file
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Create an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "stockview.toml")]
        output: PathBuf,
    },

    /// Render charts as described by a configuration file
    RunConfig {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// One SVG file per chart
    Svg,
    /// A single HTML page
    Html,
    /// Chart.js configurations
    Json,
}

impl From<FormatArg> for RenderFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Svg => RenderFormat::Svg,
            FormatArg::Html => RenderFormat::Html,
            FormatArg::Json => RenderFormat::Json,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Logging already initialized");
        }
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Symbols { source } => list_symbols(source, cli.output),

        Commands::Render {
            source,
            symbol,
            out_dir,
            format,
        } => {
            let config = resolve_config(source)?;
            let out_dir = out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.dir));
            let format = (*format)
                .map(RenderFormat::from)
                .unwrap_or(config.output.format);
            let symbol = symbol.clone().or_else(|| config.data.symbol.clone());
            render(source, &config, symbol.as_deref(), &out_dir, format)
        }

        Commands::Summary {
            source,
            symbol,
            width,
        } => summarize(source, symbol.as_deref(), *width, cli.output),

        Commands::Validate { source } => validate_data(source, cli.output),

        Commands::Init { output } => init_config(output),

        Commands::RunConfig { config } => run_from_config(config),
    }
}

/// Load the config file (if any) and apply command-line overrides.
fn resolve_config(source: &SourceArgs) -> Result<ViewerFileConfig> {
    let mut config = match &source.config {
        Some(path) => ViewerFileConfig::load(path)?,
        None => ViewerFileConfig::default(),
    };

    if let Some(path) = &source.data {
        config.data.path = Some(path.display().to_string());
    }
    if let Some(url) = &source.url {
        config.remote.url = Some(url.clone());
    }
    if source.delimiter.is_some() {
        config.data.delimiter = source.delimiter;
    }
    if source.no_sort {
        config.data.sort_by_date = false;
    }

    config.validate()?;
    Ok(config)
}

fn load_dataset(source: &SourceArgs, config: &ViewerFileConfig) -> Result<Dataset> {
    let data_config: DataConfig = config.data_config();
    let use_remote = source.remote || source.url.is_some();

    match (&config.data.path, use_remote) {
        (Some(path), false) => load_csv(path, &data_config),
        _ if use_remote || config.remote.url.is_some() => {
            let remote: RemoteSource = config.remote_source();
            load_remote(&remote, &data_config)
        }
        _ => Err(ViewerError::ConfigError(
            "No data source: pass --data <file> or --remote".to_string(),
        )),
    }
}

/// Pick the requested symbol, or the first one, and project it.
fn select_series(
    dataset: &Dataset,
    symbol: Option<&str>,
    options: &ProjectionOptions,
) -> Result<CompanySeries> {
    let symbols = distinct_symbols(dataset);
    let symbol = match symbol {
        Some(s) => s.to_string(),
        None => symbols.first().cloned().ok_or(ViewerError::NoData)?,
    };

    project(dataset, &symbol, options).ok_or_else(|| {
        ViewerError::InvalidInput(format!(
            "Symbol '{}' not found ({} symbols available)",
            symbol,
            symbols.len()
        ))
    })
}

fn list_symbols(source: &SourceArgs, output: OutputFormat) -> Result<()> {
    let config = resolve_config(source)?;
    let dataset = load_dataset(source, &config)?;
    let symbols = distinct_symbols(&dataset);

    match output {
        OutputFormat::Text => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&symbols)?),
    }
    Ok(())
}

fn render(
    source: &SourceArgs,
    config: &ViewerFileConfig,
    symbol: Option<&str>,
    out_dir: &PathBuf,
    format: RenderFormat,
) -> Result<()> {
    let dataset = load_dataset(source, config)?;
    let series = select_series(&dataset, symbol, &config.projection_options())?;
    let groups = config.groups();

    fs::create_dir_all(out_dir)?;

    let mut registry = ChartRegistry::new();
    let stem = file_stem(&series.symbol);

    match format {
        RenderFormat::Svg => {
            let mut renderer = SvgRenderer::new(out_dir);
            let count = registry.dispatch(&mut renderer, &groups, &series)?;
            for path in renderer.files() {
                println!("  Saved: {}", path.display());
            }
            println!(
                "{}",
                format!("Rendered {} charts for {}", count, series.symbol).bold()
            );
        }
        RenderFormat::Html | RenderFormat::Json => {
            let mut renderer = MemoryRenderer::new();
            registry.dispatch(&mut renderer, &groups, &series)?;
            let charts: Vec<ChartConfig> = renderer.charts().into_iter().cloned().collect();

            let path = if format == RenderFormat::Html {
                let path = out_dir.join(format!("{}.html", stem));
                export_html(&charts, &series.symbol, &path)?;
                path
            } else {
                let path = out_dir.join(format!("{}.json", stem));
                export_json(&charts, &path)?;
                path
            };
            println!("  Saved: {}", path.display());
        }
    }

    Ok(())
}

fn summarize(
    source: &SourceArgs,
    symbol: Option<&str>,
    width: usize,
    output: OutputFormat,
) -> Result<()> {
    let config = resolve_config(source)?;
    let dataset = load_dataset(source, &config)?;
    let symbol = symbol.map(str::to_string).or_else(|| config.data.symbol.clone());
    let series = select_series(&dataset, symbol.as_deref(), &config.projection_options())?;

    match output {
        OutputFormat::Text => print!("{}", selection_summary(&series, width)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
    }
    Ok(())
}

fn validate_data(source: &SourceArgs, output: OutputFormat) -> Result<()> {
    let config = resolve_config(source)?;
    let dataset = load_dataset(source, &config)?;
    let symbols = distinct_symbols(&dataset);
    let missing: Vec<Column> = dataset.missing_columns();

    if output == OutputFormat::Json {
        let report = serde_json::json!({
            "source": &dataset.source,
            "rows": dataset.len(),
            "columns": &dataset.headers,
            "missing_columns": &missing,
            "symbols": symbols.len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Validating data: {}", dataset.source);
    println!("\n{}", "Data Summary".bold().underline());
    println!("  Rows: {}", dataset.len());
    println!("  Columns: {}", dataset.headers.join(", "));
    println!("  Symbols: {}", symbols.len());

    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|c| c.header()).collect();
        println!("  Missing columns: {}", names.join(", ").yellow());
    }

    if !dataset.has_column(Column::Symbol) {
        println!("\nValidation: {}", "FAILED (no SYMBOL column)".red().bold());
        return Err(ViewerError::DataError("No SYMBOL column".to_string()));
    }

    println!("\nValidation: {}", "PASSED".green().bold());
    Ok(())
}

fn init_config(output: &PathBuf) -> Result<()> {
    let example = ViewerFileConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to customize your charts, then run:");
    println!("  stockview run-config -c {}", output.display());
    Ok(())
}

fn run_from_config(config_path: &PathBuf) -> Result<()> {
    info!("Loading configuration from: {}", config_path.display());

    let source = SourceArgs {
        config: Some(config_path.clone()),
        ..Default::default()
    };
    let config = resolve_config(&source)?;
    let out_dir = PathBuf::from(&config.output.dir);
    render(
        &source,
        &config,
        config.data.symbol.as_deref(),
        &out_dir,
        config.output.format,
    )
}
