//! Chart rendering surfaces and chart lifecycle.
//!
//! A [`ChartRenderer`] owns the charts it creates and hands back opaque
//! [`ChartHandle`]s. The [`ChartRegistry`] remembers every live handle so a
//! new selection first disposes of the previous charts; a canvas never holds
//! two charts at once.

use crate::charts::{build_chart, ChartConfig, ChartKind, MetricGroup};
use crate::error::{Result, ViewerError};
use crate::export::file_stem;
use crate::projection::CompanySeries;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Opaque id of a chart owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartHandle(u64);

impl ChartHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A surface that can display and dispose of charts.
pub trait ChartRenderer {
    /// Display a chart and return its handle.
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle>;

    /// Release a chart's resources.
    fn destroy(&mut self, handle: ChartHandle) -> Result<()>;
}

/// Live chart handles of the current selection.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    live: Vec<ChartHandle>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> &[ChartHandle] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Destroy every live chart and clear the list.
    ///
    /// A failed destroy is logged and does not stop the others. Returns the
    /// number of charts destroyed cleanly.
    pub fn reset<R: ChartRenderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        let mut destroyed = 0;
        for handle in self.live.drain(..) {
            match renderer.destroy(handle) {
                Ok(()) => destroyed += 1,
                Err(e) => warn!("Failed to destroy chart {}: {}", handle.id(), e),
            }
        }
        debug!("Destroyed {} charts", destroyed);
        destroyed
    }

    /// Replace the live charts with one chart per group.
    ///
    /// Charts are created in group order. The first failure stops the
    /// remaining groups; charts created before it stay registered so the
    /// next reset disposes of them.
    pub fn dispatch<R: ChartRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        groups: &[MetricGroup],
        series: &CompanySeries,
    ) -> Result<usize> {
        self.reset(renderer);

        for group in groups {
            let config = build_chart(group, series);
            let handle = renderer.create(&config)?;
            self.live.push(handle);
        }

        info!(
            "Rendered {} charts for '{}' ({} points)",
            self.live.len(),
            series.symbol,
            series.len()
        );
        Ok(self.live.len())
    }
}

// ============================================================================
// In-memory renderer
// ============================================================================

/// Keeps chart configurations in memory, keyed by handle.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    next_id: u64,
    charts: BTreeMap<ChartHandle, ChartConfig>,
    created: usize,
    destroyed: usize,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live charts in creation order.
    pub fn charts(&self) -> Vec<&ChartConfig> {
        self.charts.values().collect()
    }

    pub fn get(&self, handle: ChartHandle) -> Option<&ChartConfig> {
        self.charts.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.charts.len()
    }

    /// Total creates since construction.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Total destroys since construction.
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }
}

impl ChartRenderer for MemoryRenderer {
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle> {
        if self.charts.values().any(|c| c.id == config.id) {
            return Err(ViewerError::RenderError(format!(
                "Canvas '{}' is already in use",
                config.id
            )));
        }
        let handle = ChartHandle(self.next_id);
        self.next_id += 1;
        self.charts.insert(handle, config.clone());
        self.created += 1;
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) -> Result<()> {
        self.charts.remove(&handle).ok_or_else(|| {
            ViewerError::RenderError(format!("Unknown chart handle {}", handle.id()))
        })?;
        self.destroyed += 1;
        Ok(())
    }
}

// ============================================================================
// SVG renderer
// ============================================================================

/// Geometry of generated SVG charts.
#[derive(Debug, Clone)]
pub struct SvgStyle {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub y_ticks: usize,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 320.0,
            padding: 60.0,
            y_ticks: 5,
        }
    }
}

/// Writes each chart to `<canvas id>.svg` in a directory.
#[derive(Debug)]
pub struct SvgRenderer {
    out_dir: PathBuf,
    style: SvgStyle,
    next_id: u64,
    files: BTreeMap<ChartHandle, PathBuf>,
}

impl SvgRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self::with_style(out_dir, SvgStyle::default())
    }

    pub fn with_style(out_dir: impl Into<PathBuf>, style: SvgStyle) -> Self {
        Self {
            out_dir: out_dir.into(),
            style,
            next_id: 0,
            files: BTreeMap::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Paths of the charts currently on disk.
    pub fn files(&self) -> Vec<&Path> {
        self.files.values().map(PathBuf::as_path).collect()
    }
}

impl ChartRenderer for SvgRenderer {
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle> {
        let path = self.out_dir.join(format!("{}.svg", file_stem(&config.id)));
        if self.files.values().any(|p| *p == path) {
            return Err(ViewerError::RenderError(format!(
                "Canvas '{}' is already in use",
                config.id
            )));
        }

        let svg = chart_to_svg(config, &self.style)?;
        fs::create_dir_all(&self.out_dir)?;
        fs::write(&path, svg)?;
        debug!("Wrote {}", path.display());

        let handle = ChartHandle(self.next_id);
        self.next_id += 1;
        self.files.insert(handle, path);
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) -> Result<()> {
        let path = self.files.remove(&handle).ok_or_else(|| {
            ViewerError::RenderError(format!("Unknown chart handle {}", handle.id()))
        })?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Escape text for inclusion in SVG/HTML.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compact axis label: 1.5k, 2.3M, 4.0B.
fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// Draw a chart as a standalone SVG document.
///
/// Lines break at missing observations; bars are skipped for them.
pub fn chart_to_svg(config: &ChartConfig, style: &SvgStyle) -> Result<String> {
    let n = config.point_count();
    if n == 0 {
        return Err(ViewerError::RenderError(format!(
            "Chart '{}' has no points",
            config.id
        )));
    }

    let width = style.width;
    let height = style.height;
    let padding = style.padding;
    let chart_width = width - 2.0 * padding;
    let chart_height = height - 2.0 * padding;

    let begin_at_zero = config.options.scales.y.begin_at_zero.unwrap_or(false);
    let (mut y_min, mut y_max) = config.value_range().unwrap_or((0.0, 1.0));
    if begin_at_zero {
        y_min = y_min.min(0.0);
        y_max = y_max.max(0.0);
    }
    let span = y_max - y_min;
    if span > 0.0 {
        if !(begin_at_zero && y_min == 0.0) {
            y_min -= span * 0.05;
        }
        y_max += span * 0.05;
    } else {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let y_range = y_max - y_min;

    let y_of = |v: f64| padding + chart_height - ((v - y_min) / y_range) * chart_height;

    let grid_color = "#e0e0e0";
    let text_color = "#666";

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" id="{}">"##,
        width,
        height,
        xml_escape(&config.id)
    );
    let _ = writeln!(
        svg,
        r##"  <rect width="{}" height="{}" fill="transparent"/>"##,
        width, height
    );
    let _ = writeln!(
        svg,
        r##"  <text x="{}" y="18" font-size="14" font-weight="600" fill="#333" text-anchor="middle">{}</text>"##,
        width / 2.0,
        xml_escape(config.title())
    );

    // Y grid and tick labels
    let ticks = style.y_ticks.max(1);
    for i in 0..=ticks {
        let y_val = y_min + (i as f64 / ticks as f64) * y_range;
        let y = y_of(y_val);
        let _ = writeln!(
            svg,
            r##"  <line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="{}" stroke-dasharray="4,4"/>"##,
            padding,
            y,
            width - padding,
            y,
            grid_color
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="{:.1}" font-size="10" fill="{}" text-anchor="end">{}</text>"##,
            padding - 5.0,
            y + 3.0,
            text_color,
            format_tick(y_val)
        );
    }

    // Axis titles
    let _ = writeln!(
        svg,
        r##"  <text x="{}" y="{}" font-size="11" fill="{}" text-anchor="middle">{}</text>"##,
        width / 2.0,
        height - 8.0,
        text_color,
        xml_escape(&config.options.scales.x.title.text)
    );
    let _ = writeln!(
        svg,
        r##"  <text x="14" y="{}" font-size="11" fill="{}" text-anchor="middle" transform="rotate(-90 14 {})">{}</text>"##,
        height / 2.0,
        text_color,
        height / 2.0,
        xml_escape(&config.options.scales.y.title.text)
    );

    // First and last date labels
    if let (Some(first), Some(last)) = (config.data.labels.first(), config.data.labels.last()) {
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="{}" font-size="10" fill="{}" text-anchor="start">{}</text>"##,
            padding,
            height - padding + 15.0,
            text_color,
            xml_escape(first)
        );
        if n > 1 {
            let _ = writeln!(
                svg,
                r##"  <text x="{}" y="{}" font-size="10" fill="{}" text-anchor="end">{}</text>"##,
                width - padding,
                height - padding + 15.0,
                text_color,
                xml_escape(last)
            );
        }
    }

    match config.kind {
        ChartKind::Line => {
            for dataset in &config.data.datasets {
                let x_of = |i: usize| {
                    if n == 1 {
                        padding + chart_width / 2.0
                    } else {
                        padding + (i as f64 / (n - 1) as f64) * chart_width
                    }
                };

                let mut path_d = String::new();
                let mut pen_down = false;
                for (i, value) in dataset.data.iter().enumerate() {
                    match value {
                        Some(v) => {
                            let cmd = if pen_down { "L" } else { "M" };
                            if !path_d.is_empty() {
                                path_d.push(' ');
                            }
                            let _ = write!(path_d, "{} {:.1} {:.1}", cmd, x_of(i), y_of(*v));
                            pen_down = true;
                        }
                        None => pen_down = false,
                    }
                }

                if !path_d.is_empty() {
                    let _ = writeln!(
                        svg,
                        r##"  <path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"##,
                        path_d, dataset.border_color, dataset.border_width
                    );
                }
            }
        }
        ChartKind::Bar => {
            let groups = config.data.datasets.len().max(1);
            let slot = chart_width / n as f64;
            let bar_width = slot * 0.8 / groups as f64;
            let base = y_of(y_min.max(0.0).min(y_max));

            for (g, dataset) in config.data.datasets.iter().enumerate() {
                for (i, value) in dataset.data.iter().enumerate() {
                    let Some(v) = value else { continue };
                    let x = padding + i as f64 * slot + slot * 0.1 + g as f64 * bar_width;
                    let y = y_of(*v);
                    let (top, bar_height) = if y < base { (y, base - y) } else { (base, y - base) };
                    let _ = writeln!(
                        svg,
                        r##"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="{}" stroke-width="{}"/>"##,
                        x,
                        top,
                        bar_width,
                        bar_height,
                        dataset.background_color,
                        dataset.border_color,
                        dataset.border_width
                    );
                }
            }
        }
    }

    // Legend
    for (i, dataset) in config.data.datasets.iter().enumerate() {
        let x = padding + i as f64 * 180.0;
        let _ = writeln!(
            svg,
            r##"  <rect x="{}" y="28" width="12" height="12" fill="{}" stroke="{}"/>"##,
            x, dataset.background_color, dataset.border_color
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="38" font-size="11" fill="{}">{}</text>"##,
            x + 16.0,
            text_color,
            xml_escape(&dataset.label)
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}
