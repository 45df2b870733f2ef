//! Integration tests for loading, selection, and chart rendering.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use stockview::app::{App, AppSettings, Outcome, UiEvent};
use stockview::charts::{build_charts, default_groups};
use stockview::data::{load_csv, parse_csv_str, DataConfig};
use stockview::error::ViewerError;
use stockview::export::{export_html, export_json};
use stockview::projection::{project, ProjectionOptions};
use stockview::remote::{fetch_csv_text, load_remote, RemoteSource};
use stockview::render::{ChartRegistry, MemoryRenderer, SvgRenderer};
use stockview::symbols::distinct_symbols;
use stockview::types::Column;
use tempfile::TempDir;

const SAMPLE: &str = "SYMBOL,BUSINESS_DATE,OPEN_PRICE,CLOSE_PRICE\n\
                      ABC,2024-01-01,10.5,11.0\n\
                      XYZ,2024-01-01,5,5.2\n\
                      ABC,2024-01-02,11.0,10.8\n";

/// A full export row for one company day.
fn full_row(symbol: &str, date: &str, base: f64) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        symbol,
        date,
        base,
        base + 2.0,
        base - 1.0,
        base + 1.0,
        1000.0 + base,
        base * 10.0,
        base * 1.5,
        base * 0.5,
        base + 0.5,
        base - 0.5,
        25,
        base + 1.0
    )
}

fn full_csv() -> String {
    let header = "SYMBOL,BUSINESS_DATE,OPEN_PRICE,HIGH_PRICE,LOW_PRICE,CLOSE_PRICE,\
                  TOTAL_TRADED_QUANTITY,MARKET_CAPITALIZATION,FIFTY_TWO_WEEKS_HIGH,\
                  FIFTY_TWO_WEEKS_LOW,AVERAGE_TRADED_PRICE,PREVIOUS_DAY_CLOSE_PRICE,\
                  TOTAL_TRADES,LAST_UPDATED_PRICE";
    let mut lines = vec![header.to_string()];
    for day in 1..=10 {
        let date = format!("2024-02-{:02}", day);
        lines.push(full_row("NABIL", &date, 500.0 + day as f64));
        lines.push(full_row("NICA", &date, 300.0 - day as f64));
    }
    lines.join("\n") + "\n"
}

/// Serve one HTTP response on a local port and return its URL.
fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // Drain request headers
            while reader.read_line(&mut line).unwrap_or(0) > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let response = format!(
                "{}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{}/stock-data.csv", addr)
}

#[test]
fn test_sample_scenario_end_to_end() {
    let ds = parse_csv_str(SAMPLE, "sample", &DataConfig::default()).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(distinct_symbols(&ds), vec!["ABC", "XYZ"]);

    let series = project(&ds, "ABC", &ProjectionOptions::default()).unwrap();
    assert_eq!(series.labels, vec!["2024-01-01", "2024-01-02"]);
    assert_eq!(series.series(Column::OpenPrice), &[Some(10.5), Some(11.0)]);
    assert_eq!(series.series(Column::ClosePrice), &[Some(11.0), Some(10.8)]);
    // Columns absent from the file are all missing, never zero
    assert_eq!(series.series(Column::HighPrice), &[None, None]);
}

#[test]
fn test_unknown_symbol_does_not_update_charts() {
    let mut app = App::default();
    let mut renderer = MemoryRenderer::new();

    app.handle(
        UiEvent::TextLoaded {
            source: "sample".to_string(),
            text: SAMPLE.to_string(),
        },
        &mut renderer,
    )
    .unwrap();
    let created = renderer.created();
    let destroyed = renderer.destroyed();

    let outcome = app
        .handle(UiEvent::SymbolChanged("NOPE".to_string()), &mut renderer)
        .unwrap();

    assert_eq!(outcome, Outcome::Unchanged);
    assert_eq!(renderer.created(), created);
    assert_eq!(renderer.destroyed(), destroyed);
    assert_eq!(renderer.live_count(), 5);
}

#[test]
fn test_file_load_then_switch_symbols() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stock-data.csv");
    std::fs::write(&path, full_csv()).unwrap();

    let mut app = App::default();
    let mut renderer = MemoryRenderer::new();

    let outcome = app
        .handle(UiEvent::FileSelected(path.clone()), &mut renderer)
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Loaded {
            symbols: vec!["NABIL".to_string(), "NICA".to_string()]
        }
    );
    assert_eq!(app.selector().selected(), Some("NABIL"));
    assert_eq!(renderer.live_count(), 5);

    let outcome = app
        .handle(UiEvent::SymbolChanged("NICA".to_string()), &mut renderer)
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Rendered {
            symbol: "NICA".to_string(),
            charts: 5
        }
    );
    // Previous five were disposed before the new five were created
    assert_eq!(renderer.created(), 10);
    assert_eq!(renderer.destroyed(), 5);
    assert_eq!(renderer.live_count(), 5);

    let price = renderer
        .charts()
        .into_iter()
        .find(|c| c.id == "stockPriceChart")
        .unwrap();
    assert_eq!(price.title(), "NICA: Stock Prices");
    assert_eq!(price.point_count(), 10);
}

#[test]
fn test_failed_load_keeps_previous_state() {
    let mut app = App::default();
    let mut renderer = MemoryRenderer::new();

    app.handle(
        UiEvent::TextLoaded {
            source: "sample".to_string(),
            text: SAMPLE.to_string(),
        },
        &mut renderer,
    )
    .unwrap();

    let outcome = app
        .handle(
            UiEvent::FileSelected("/definitely/not/here.csv".into()),
            &mut renderer,
        )
        .unwrap();

    assert!(matches!(outcome, Outcome::Failed(_)));
    assert_eq!(app.dataset().unwrap().len(), 3);
    assert_eq!(app.selector().selected(), Some("ABC"));
    assert_eq!(renderer.live_count(), 5);
}

#[test]
fn test_svg_renderer_replaces_files() {
    let ds = parse_csv_str(&full_csv(), "full", &DataConfig::default()).unwrap();
    let dir = TempDir::new().unwrap();
    let mut renderer = SvgRenderer::new(dir.path());
    let mut registry = ChartRegistry::new();
    let groups = default_groups();

    let nabil = project(&ds, "NABIL", &ProjectionOptions::default()).unwrap();
    assert_eq!(registry.dispatch(&mut renderer, &groups, &nabil).unwrap(), 5);
    let first = std::fs::read_to_string(dir.path().join("stockPriceChart.svg")).unwrap();
    assert!(first.contains("NABIL: Stock Prices"));

    let nica = project(&ds, "NICA", &ProjectionOptions::default()).unwrap();
    assert_eq!(registry.dispatch(&mut renderer, &groups, &nica).unwrap(), 5);
    let second = std::fs::read_to_string(dir.path().join("stockPriceChart.svg")).unwrap();
    assert!(second.contains("NICA: Stock Prices"));
    assert!(!second.contains("NABIL"));

    assert_eq!(renderer.files().len(), 5);
    assert_eq!(registry.reset(&mut renderer), 5);
    assert!(!dir.path().join("stockPriceChart.svg").exists());
}

#[test]
fn test_exports_from_file() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("data.csv");
    std::fs::write(&csv_path, full_csv()).unwrap();

    let ds = load_csv(&csv_path, &DataConfig::default()).unwrap();
    let series = project(&ds, "NABIL", &ProjectionOptions::default()).unwrap();
    let charts = build_charts(&default_groups(), &series);

    let json_path = dir.path().join("NABIL.json");
    export_json(&charts, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 5);
    assert_eq!(json[1]["type"], "bar");
    assert_eq!(json[1]["data"]["datasets"][0]["label"], "Total Traded Quantity");

    let html_path = dir.path().join("NABIL.html");
    export_html(&charts, "NABIL", &html_path).unwrap();
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert_eq!(html.matches("<svg").count(), 5);
    assert!(html.contains("<title>Stock Charts: NABIL</title>"));
}

#[test]
fn test_semicolon_file_detected() {
    let text = SAMPLE.replace(',', ";");
    let ds = parse_csv_str(&text, "semi", &DataConfig::default()).unwrap();
    assert_eq!(distinct_symbols(&ds), vec!["ABC", "XYZ"]);
}

#[test]
fn test_fetch_remote_csv() {
    let url = serve_once("HTTP/1.1 200 OK", SAMPLE.to_string());
    let source = RemoteSource::new(url.clone());

    let ds = load_remote(&source, &DataConfig::default()).unwrap();
    assert_eq!(ds.source, url);
    assert_eq!(ds.len(), 3);
    assert_eq!(distinct_symbols(&ds), vec!["ABC", "XYZ"]);
}

#[test]
fn test_fetch_remote_not_found() {
    let url = serve_once("HTTP/1.1 404 Not Found", "missing".to_string());
    let source = RemoteSource::new(url);

    match fetch_csv_text(&source) {
        Err(ViewerError::HttpStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[test]
fn test_remote_load_event() {
    let url = serve_once("HTTP/1.1 200 OK", full_csv());
    let settings = AppSettings {
        remote: RemoteSource::new(url),
        ..Default::default()
    };
    let mut app = App::new(settings);
    let mut renderer = MemoryRenderer::new();

    let outcome = app
        .handle(UiEvent::RemoteLoadRequested, &mut renderer)
        .unwrap();
    assert!(matches!(outcome, Outcome::Loaded { ref symbols } if symbols.len() == 2));
    assert_eq!(renderer.live_count(), 5);
}

#[test]
fn test_remote_failure_reported_as_outcome() {
    let url = serve_once("HTTP/1.1 500 Internal Server Error", String::new());
    let settings = AppSettings {
        remote: RemoteSource::new(url),
        ..Default::default()
    };
    let mut app = App::new(settings);
    let mut renderer = MemoryRenderer::new();

    let outcome = app
        .handle(UiEvent::RemoteLoadRequested, &mut renderer)
        .unwrap();
    assert!(matches!(outcome, Outcome::Failed(ref msg) if msg.contains("500")));
    assert!(app.dataset().is_none());
    assert_eq!(renderer.created(), 0);
}
