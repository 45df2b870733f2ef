//! Configuration file support.
//!
//! Chart layout, data source, and output settings can be kept in a TOML file
//! so a dashboard is reproducible.

use crate::charts::{default_groups, MetricGroup};
use crate::data::DataConfig;
use crate::error::{Result, ViewerError};
use crate::projection::ProjectionOptions;
use crate::remote::{RemoteSource, DEFAULT_BUCKET, DEFAULT_KEY, DEFAULT_REGION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Complete viewer configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerFileConfig {
    /// Ingestion and projection settings.
    #[serde(default)]
    pub data: DataSettings,
    /// Remote source settings.
    #[serde(default)]
    pub remote: RemoteSettings,
    /// Output settings.
    #[serde(default)]
    pub output: OutputSettings,
    /// Custom charts; the default five are used when empty.
    #[serde(default)]
    pub charts: Vec<MetricGroup>,
}

/// Ingestion and projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to a local CSV file.
    pub path: Option<String>,
    /// CSV delimiter; auto-detected when unset.
    pub delimiter: Option<char>,
    /// Order each symbol's rows by business date.
    #[serde(default = "default_true")]
    pub sort_by_date: bool,
    /// Business date format.
    pub date_format: Option<String>,
    /// Symbol to show instead of the first one.
    pub symbol: Option<String>,
}

fn default_true() -> bool { true }

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: None,
            sort_by_date: true,
            date_format: None,
            symbol: None,
        }
    }
}

/// Remote source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Full URL; overrides bucket/region/key.
    pub url: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_bucket() -> String { DEFAULT_BUCKET.to_string() }
fn default_region() -> String { DEFAULT_REGION.to_string() }
fn default_key() -> String { DEFAULT_KEY.to_string() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            key: DEFAULT_KEY.to_string(),
            timeout_secs: 30,
            headers: BTreeMap::new(),
        }
    }
}

/// Output format of rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    Svg,
    Html,
    Json,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_format")]
    pub format: RenderFormat,
}

fn default_output_dir() -> String { "charts".to_string() }
fn default_format() -> RenderFormat { RenderFormat::Html }

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: "charts".to_string(),
            format: RenderFormat::Html,
        }
    }
}

impl ViewerFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: ViewerFileConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check settings that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if let Some(d) = self.data.delimiter {
            if !d.is_ascii() {
                return Err(ViewerError::ConfigError(format!(
                    "Delimiter must be a single ASCII character, got {:?}",
                    d
                )));
            }
        }
        if self.remote.timeout_secs == 0 {
            return Err(ViewerError::ConfigError(
                "remote.timeout_secs must be positive".to_string(),
            ));
        }
        let mut ids = std::collections::HashSet::new();
        for group in &self.charts {
            group.validate()?;
            if !ids.insert(group.id.as_str()) {
                return Err(ViewerError::ConfigError(format!(
                    "Duplicate chart id '{}'",
                    group.id
                )));
            }
        }
        Ok(())
    }

    pub fn data_config(&self) -> DataConfig {
        DataConfig {
            delimiter: self.data.delimiter.map(|c| c as u8),
            ..Default::default()
        }
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            sort_by_date: self.data.sort_by_date,
            date_format: self.data.date_format.clone(),
        }
    }

    pub fn remote_source(&self) -> RemoteSource {
        let base = match &self.remote.url {
            Some(url) => RemoteSource::new(url.clone()),
            None => RemoteSource::s3(&self.remote.bucket, &self.remote.region, &self.remote.key),
        };
        self.remote
            .headers
            .iter()
            .fold(
                base.with_timeout(Duration::from_secs(self.remote.timeout_secs)),
                |source, (name, value)| source.with_header(name.clone(), value.clone()),
            )
    }

    /// Charts to render: the configured ones, or the default five.
    pub fn groups(&self) -> Vec<MetricGroup> {
        if self.charts.is_empty() {
            default_groups()
        } else {
            self.charts.clone()
        }
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# stockview configuration file

[data]
# path = "data/stock-data.csv"
# delimiter = ","
sort_by_date = true
# date_format = "%Y-%m-%d"
# symbol = "NABIL"

[remote]
# url = "https://example.com/stock-data.csv"
bucket = "nepse-stock-data"
region = "us-east-1"
key = "stock-data.csv"
timeout_secs = 30

# [remote.headers]
# Authorization = "Bearer <token>"

[output]
dir = "charts"
format = "html"   # svg, html, or json

# The five default charts are used unless charts are listed here.
# [[charts]]
# id = "fiftyTwoWeekChart"
# title = "52-Week Range"
# kind = "line"
# y_axis_title = "Price"
# begin_at_zero = false
#
# [[charts.series]]
# label = "52-Week High"
# column = "FIFTY_TWO_WEEKS_HIGH"
# color = [255, 99, 132]
#
# [[charts.series]]
# label = "52-Week Low"
# column = "FIFTY_TWO_WEEKS_LOW"
# color = [54, 162, 235]
"#
        .to_string()
    }
}
