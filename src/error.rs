//! Error types for loading, projecting, and rendering stock data.

use thiserror::Error;

/// Main error type for the viewer.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("No data loaded")]
    NoData,

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
