//! Export of a rendered selection.
//!
//! | Format | Use Case |
//! |--------|----------|
//! | HTML | Self-contained page with one inline SVG per chart |
//! | JSON | Chart.js configurations for a browser front end |
//!
//! # Example
//!
//! ```ignore
//! use stockview::charts::{build_charts, default_groups};
//! use stockview::export::{export_html, export_json};
//!
//! let charts = build_charts(&default_groups(), &series);
//! export_html(&charts, "ABC", "abc.html")?;
//! export_json(&charts, "abc.json")?;
//! ```

use crate::charts::ChartConfig;
use crate::error::Result;
use crate::render::{chart_to_svg, xml_escape, SvgStyle};
use chrono::Utc;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// File stem for a symbol's output files.
///
/// Anything outside `[A-Za-z0-9_-]` becomes `_`, so the name can never leave
/// the output directory. An empty symbol maps to `chart`.
pub fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "chart".to_string()
    } else {
        stem
    }
}

/// Write chart configurations as a JSON array.
pub fn export_json(charts: &[ChartConfig], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, charts)?;
    writer.flush()?;
    info!("Exported {} chart configs to {}", charts.len(), path.display());
    Ok(())
}

/// Write a self-contained HTML page with every chart.
pub fn export_html(charts: &[ChartConfig], title: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_html(&mut writer, charts, title)?;
    writer.flush()?;
    info!("Exported HTML page to {}", path.display());
    Ok(())
}

/// Render the HTML page to a string.
pub fn html_page(charts: &[ChartConfig], title: &str) -> Result<String> {
    let mut buf = Vec::new();
    write_html(&mut buf, charts, title)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_html<W: Write>(writer: &mut W, charts: &[ChartConfig], title: &str) -> Result<()> {
    write!(writer, "{}", html_header(title))?;

    let style = SvgStyle::default();
    for chart in charts {
        writeln!(writer, "  <div class=\"section\">")?;
        writeln!(writer, "    <h2>{}</h2>", xml_escape(chart.title()))?;
        writeln!(writer, "    <div class=\"chart-container\">")?;
        write!(writer, "{}", chart_to_svg(chart, &style)?)?;
        writeln!(writer, "    </div>")?;
        writeln!(writer, "  </div>")?;
    }

    if charts.is_empty() {
        writeln!(writer, "  <div class=\"section\"><p>No charts.</p></div>")?;
    }

    write!(writer, "{}", html_footer())?;
    Ok(())
}

/// Generate HTML header with embedded CSS.
fn html_header(title: &str) -> String {
    let title = xml_escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Stock Charts: {}</title>
  <style>
    :root {{
      --bg-color: #ffffff;
      --text-color: #1a1a2e;
      --card-bg: #f8f9fa;
      --border-color: #e9ecef;
      --neutral: #6c757d;
      --accent: #007bff;
    }}
    @media (prefers-color-scheme: dark) {{
      :root {{
        --bg-color: #1a1a2e;
        --text-color: #e9ecef;
        --card-bg: #16213e;
        --border-color: #0f3460;
        --neutral: #94a3b8;
        --accent: #60a5fa;
      }}
    }}
    * {{ box-sizing: border-box; margin: 0; padding: 0; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      background: var(--bg-color);
      color: var(--text-color);
      line-height: 1.6;
      padding: 2rem;
      max-width: 1200px;
      margin: 0 auto;
    }}
    h1 {{
      font-size: 1.75rem;
      margin-bottom: 1.5rem;
      padding-bottom: 0.5rem;
      border-bottom: 2px solid var(--accent);
    }}
    h2 {{
      font-size: 1.25rem;
      margin-bottom: 1rem;
      color: var(--accent);
    }}
    .section {{
      margin-bottom: 2rem;
      padding: 1.5rem;
      background: var(--card-bg);
      border-radius: 8px;
      border: 1px solid var(--border-color);
    }}
    .chart-container {{
      background: var(--bg-color);
      border-radius: 6px;
      padding: 1rem;
      overflow-x: auto;
    }}
    .chart-container svg {{
      width: 100%;
      height: auto;
      min-height: 200px;
    }}
    .footer {{
      text-align: center;
      padding: 2rem;
      color: var(--neutral);
      font-size: 0.75rem;
    }}
  </style>
</head>
<body>
  <h1>Stock Charts: {}</h1>
"#,
        title, title
    )
}

/// Generate HTML footer.
fn html_footer() -> String {
    format!(
        r#"  <div class="footer">
    <p>Generated on {} by stockview</p>
  </div>
</body>
</html>
"#,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
