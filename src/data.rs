//! CSV ingestion for daily stock records.
//!
//! Every loader produces a [`Dataset`]: the header row becomes the column
//! names and each record becomes a [`Row`] of untouched string values.
//! Blank lines, and records whose cells are all empty or whitespace, are
//! skipped.

use crate::error::{Result, ViewerError};
use crate::types::{Dataset, Row};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Ingestion configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// CSV delimiter character. If None, delimiter is auto-detected.
    pub delimiter: Option<u8>,
    /// Trim surrounding whitespace from header names.
    pub trim_headers: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim_headers: true,
        }
    }
}

/// Common delimiters to try (comma, tab, semicolon, pipe).
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Pick the delimiter that splits the sample lines most consistently.
///
/// Falls back to comma when nothing splits every line into at least two
/// fields.
fn detect_delimiter_in_lines(lines: &[String]) -> u8 {
    let lines: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return b',';
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.as_bytes().iter().filter(|&&b| b == delim).count() + 1)
            .collect();

        let first_count = counts[0];
        let all_consistent = counts.iter().all(|&c| c == first_count);

        if all_consistent && first_count >= 2 && first_count > best_score {
            best_score = first_count;
            best_delimiter = delim;
        }
    }

    debug!(
        "Detected delimiter {:?} with score {}",
        best_delimiter as char, best_score
    );
    best_delimiter
}

/// Detect the delimiter from the first few lines of a file.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().take(5).filter_map(|l| l.ok()).collect();
    Ok(detect_delimiter_in_lines(&lines))
}

/// Detect the delimiter from the first few lines of in-memory text.
fn detect_delimiter_str(text: &str) -> u8 {
    let lines: Vec<String> = text.lines().take(5).map(str::to_string).collect();
    detect_delimiter_in_lines(&lines)
}

/// Load a dataset from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<Dataset> {
    let path = path.as_ref();
    info!("Loading data from: {}", path.display());

    let delimiter = match config.delimiter {
        Some(d) => d,
        None => {
            let detected = detect_delimiter(path)?;
            debug!("Auto-detected delimiter: {:?}", char::from(detected));
            detected
        }
    };

    let file = File::open(path)?;
    read_dataset(
        file,
        &path.display().to_string(),
        &DataConfig {
            delimiter: Some(delimiter),
            ..config.clone()
        },
    )
}

/// Parse a dataset from CSV text (an upload body or a fetched response).
pub fn parse_csv_str(text: &str, source: &str, config: &DataConfig) -> Result<Dataset> {
    let delimiter = config
        .delimiter
        .unwrap_or_else(|| detect_delimiter_str(text));

    read_dataset(
        text.as_bytes(),
        source,
        &DataConfig {
            delimiter: Some(delimiter),
            ..config.clone()
        },
    )
}

fn read_dataset<R: Read>(reader: R, source: &str, config: &DataConfig) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter.unwrap_or(b','))
        .flexible(true)
        .from_reader(reader);

    let header_record = reader.headers()?.clone();
    if header_record.is_empty() || is_blank(&header_record) {
        return Err(ViewerError::NoData);
    }

    // Column slots: None marks a header cell that is dropped.
    let mut headers: Vec<String> = Vec::with_capacity(header_record.len());
    let mut slots: Vec<Option<usize>> = Vec::with_capacity(header_record.len());
    for (idx, raw) in header_record.iter().enumerate() {
        let name = if config.trim_headers { raw.trim() } else { raw };
        if name.is_empty() {
            warn!("Ignoring column {} with an empty header", idx + 1);
            slots.push(None);
        } else if headers.iter().any(|h| h == name) {
            warn!("Ignoring repeated header '{}' at column {}", name, idx + 1);
            slots.push(None);
        } else {
            slots.push(Some(headers.len()));
            headers.push(name.to_string());
        }
    }

    let mut rows = Vec::new();
    let mut blank = 0;
    let mut short = 0;

    for result in reader.records() {
        let record = result?;
        if is_blank(&record) {
            blank += 1;
            continue;
        }
        if record.len() < header_record.len() {
            short += 1;
        }

        let mut row = Row::new();
        for (field, slot) in record.iter().zip(&slots) {
            if let Some(idx) = slot {
                row.insert(headers[*idx].as_str(), field);
            }
        }
        rows.push(row);
    }

    if blank > 0 {
        debug!("Skipped {} blank records", blank);
    }
    if short > 0 {
        warn!("{} rows have fewer cells than the header", short);
    }

    info!(
        "Loaded {} rows with {} columns from {}",
        rows.len(),
        headers.len(),
        source
    );

    Ok(Dataset::new(source, headers, rows))
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Parse a business date with multiple format attempts.
///
/// An explicit format is tried first, then common date and datetime layouts,
/// then a Unix timestamp in seconds.
pub fn parse_date(s: &str, format: Option<&str>) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Some(fmt) = format {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y/%m/%d %H:%M:%S",
        "%d-%m-%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%b-%Y",  // 15-Jan-2024
        "%d %b %Y",  // 15 Jan 2024
        "%b %d, %Y", // Jan 15, 2024
    ];

    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
        }
    }

    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(ViewerError::DataError(format!(
        "Could not parse date: '{}'",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "SYMBOL,BUSINESS_DATE,OPEN_PRICE,CLOSE_PRICE\n\
                          ABC,2024-01-01,10.5,11.0\n\
                          XYZ,2024-01-01,5,5.2\n\
                          ABC,2024-01-02,11.0,10.8\n";

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv(SAMPLE);
        let ds = load_csv(file.path(), &DataConfig::default()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.headers,
            vec!["SYMBOL", "BUSINESS_DATE", "OPEN_PRICE", "CLOSE_PRICE"]
        );
        assert_eq!(ds.rows[0].get("OPEN_PRICE"), Some("10.5"));
        assert_eq!(ds.rows[2].get("CLOSE_PRICE"), Some("10.8"));
    }

    #[test]
    fn test_values_are_not_coerced() {
        let ds = parse_csv_str("SYMBOL,OPEN_PRICE\nABC, 010.50 \n", "mem", &DataConfig::default())
            .unwrap();
        assert_eq!(ds.rows[0].get("OPEN_PRICE"), Some(" 010.50 "));
    }

    #[test]
    fn test_skips_blank_lines() {
        let text = "SYMBOL,CLOSE_PRICE\n\nABC,1\n\n , \nXYZ,2\n\n";
        let ds = parse_csv_str(text, "mem", &DataConfig::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[1].symbol(), Some("XYZ"));
    }

    #[test]
    fn test_short_and_long_rows() {
        let text = "SYMBOL,OPEN_PRICE,CLOSE_PRICE\nABC,1\nXYZ,2,3,4\n";
        let ds = parse_csv_str(text, "mem", &DataConfig::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].get("CLOSE_PRICE"), None);
        assert_eq!(ds.rows[1].len(), 3);
    }

    #[test]
    fn test_empty_and_repeated_headers_dropped() {
        let text = "SYMBOL,,CLOSE_PRICE,SYMBOL\nABC,x,1,DUP\n";
        let ds = parse_csv_str(text, "mem", &DataConfig::default()).unwrap();
        assert_eq!(ds.headers, vec!["SYMBOL", "CLOSE_PRICE"]);
        assert_eq!(ds.rows[0].symbol(), Some("ABC"));
        assert_eq!(ds.rows[0].len(), 2);
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let ds = parse_csv_str("SYMBOL,CLOSE_PRICE\n", "mem", &DataConfig::default()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.headers.len(), 2);
    }

    #[test]
    fn test_no_header_is_no_data() {
        let err = parse_csv_str("", "mem", &DataConfig::default()).unwrap_err();
        assert!(matches!(err, ViewerError::NoData));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_csv_str(SAMPLE, "mem", &DataConfig::default()).unwrap();
        let second = parse_csv_str(SAMPLE, "mem", &DataConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_detect_delimiter() {
        let lines = vec![
            "SYMBOL;OPEN_PRICE;CLOSE_PRICE".to_string(),
            "ABC;1;2".to_string(),
        ];
        assert_eq!(detect_delimiter_in_lines(&lines), b';');

        let tabbed = "SYMBOL\tCLOSE_PRICE\nABC\t1\n";
        let ds = parse_csv_str(tabbed, "mem", &DataConfig::default()).unwrap();
        assert_eq!(ds.rows[0].get("CLOSE_PRICE"), Some("1"));

        assert_eq!(detect_delimiter_in_lines(&[]), b',');
    }

    #[test]
    fn test_explicit_delimiter() {
        let file = create_test_csv("SYMBOL|CLOSE_PRICE\nABC|7\n");
        let config = DataConfig {
            delimiter: Some(b'|'),
            ..Default::default()
        };
        let ds = load_csv(file.path(), &config).unwrap();
        assert_eq!(ds.rows[0].get("CLOSE_PRICE"), Some("7"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv("/nonexistent/stock.csv", &DataConfig::default()).unwrap_err();
        assert!(matches!(err, ViewerError::IoError(_)));
    }

    #[test]
    fn test_date_parsing() {
        let dt = parse_date("2024-01-15", None).unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);

        let dt2 = parse_date("2024-01-15 09:30:00", None).unwrap();
        assert_eq!(dt2.hour(), 9);
        assert_eq!(dt2.minute(), 30);

        let dt3 = parse_date("15-Jan-2024", None).unwrap();
        assert_eq!(dt3.day(), 15);

        let dt4 = parse_date("2024.01.15", Some("%Y.%m.%d")).unwrap();
        assert_eq!(dt4.month(), 1);

        assert!(parse_date("not a date", None).is_err());
    }
}
