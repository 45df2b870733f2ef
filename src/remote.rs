//! Remote CSV retrieval over HTTP(S).
//!
//! A [`RemoteSource`] names a fixed URL, typically an object in a public
//! storage bucket. Fetching is a single blocking GET: no retry, no
//! cancellation.

use crate::data::{parse_csv_str, DataConfig};
use crate::error::{Result, ViewerError};
use crate::types::Dataset;
use std::time::Duration;
use tracing::{debug, info};

/// Default bucket holding the daily stock export.
pub const DEFAULT_BUCKET: &str = "nepse-stock-data";
/// Default bucket region.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default object key of the export.
pub const DEFAULT_KEY: &str = "stock-data.csv";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fixed remote location serving the stock CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSource {
    /// Full HTTP(S) URL of the CSV.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Extra request headers, e.g. credentials for a private bucket.
    pub headers: Vec<(String, String)>,
}

impl RemoteSource {
    /// Source for an arbitrary URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }

    /// Source for an object in an S3 bucket, addressed virtual-host style.
    pub fn s3(bucket: &str, region: &str, key: &str) -> Self {
        Self::new(format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            bucket,
            region,
            key.trim_start_matches('/')
        ))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::s3(DEFAULT_BUCKET, DEFAULT_REGION, DEFAULT_KEY)
    }
}

/// Fetch the raw CSV text.
pub fn fetch_csv_text(source: &RemoteSource) -> Result<String> {
    if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
        return Err(ViewerError::InvalidInput(format!(
            "Unsupported URL scheme: {}",
            source.url
        )));
    }

    info!("Fetching CSV from: {}", source.url);

    let client = reqwest::blocking::Client::builder()
        .timeout(source.timeout)
        .user_agent(concat!("stockview/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut request = client.get(&source.url);
    for (name, value) in &source.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ViewerError::HttpStatus {
            status: status.as_u16(),
            url: source.url.clone(),
        });
    }

    let body = response.text()?;
    debug!("Fetched {} bytes from {}", body.len(), source.url);
    Ok(body)
}

/// Fetch and parse the remote CSV.
pub fn load_remote(source: &RemoteSource, config: &DataConfig) -> Result<Dataset> {
    let text = fetch_csv_text(source)?;
    parse_csv_str(&text, &source.url, config)
}
