//! Metric groups and declarative chart configurations.
//!
//! A [`MetricGroup`] says which columns go on one chart and how they look.
//! [`build_chart`] combines a group with a projected [`CompanySeries`] into a
//! [`ChartConfig`] whose JSON form follows the Chart.js configuration layout,
//! so it can be handed to a browser renderer unchanged.

use crate::error::{Result, ViewerError};
use crate::projection::CompanySeries;
use crate::types::{Column, Observation};
use serde::{Deserialize, Serialize};

/// Chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

impl ChartKind {
    /// Default stroke width for this kind.
    pub fn default_border_width(&self) -> u32 {
        match self {
            ChartKind::Line => 2,
            ChartKind::Bar => 1,
        }
    }
}

/// An opaque RGB color; alpha is applied when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// CSS `rgba()` string with the given alpha.
    pub fn rgba(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.0, self.1, self.2, alpha)
    }
}

/// Alpha of the fill behind a series.
pub const BACKGROUND_ALPHA: f64 = 0.2;

/// One series on a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    /// Legend label.
    pub label: String,
    /// Source column; must be numeric.
    pub column: Column,
    pub color: Rgb,
    /// Stroke width; defaults by chart kind.
    #[serde(default)]
    pub border_width: Option<u32>,
}

impl SeriesStyle {
    pub fn new(label: &str, column: Column, color: Rgb) -> Self {
        Self {
            label: label.to_string(),
            column,
            color,
            border_width: None,
        }
    }
}

/// A chart: its canvas id, axes, and series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricGroup {
    /// Canvas id the chart is drawn into.
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub y_axis_title: String,
    #[serde(default)]
    pub begin_at_zero: bool,
    pub series: Vec<SeriesStyle>,
}

impl MetricGroup {
    /// Check the group can be built from projected data.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ViewerError::ConfigError(
                "Chart id must not be empty".to_string(),
            ));
        }
        if self.series.is_empty() {
            return Err(ViewerError::ConfigError(format!(
                "Chart '{}' has no series",
                self.id
            )));
        }
        if let Some(s) = self.series.iter().find(|s| !s.column.is_numeric()) {
            return Err(ViewerError::ConfigError(format!(
                "Chart '{}' plots non-numeric column {}",
                self.id, s.column
            )));
        }
        Ok(())
    }
}

/// The five charts of the stock dashboard.
pub fn default_groups() -> Vec<MetricGroup> {
    vec![
        MetricGroup {
            id: "stockPriceChart".to_string(),
            title: "Stock Prices".to_string(),
            kind: ChartKind::Line,
            y_axis_title: "Price".to_string(),
            begin_at_zero: false,
            series: vec![
                SeriesStyle::new("Open Price", Column::OpenPrice, Rgb(75, 192, 192)),
                SeriesStyle::new("Close Price", Column::ClosePrice, Rgb(255, 99, 132)),
            ],
        },
        MetricGroup {
            id: "tradingVolumeChart".to_string(),
            title: "Trading Volume".to_string(),
            kind: ChartKind::Bar,
            y_axis_title: "Quantity".to_string(),
            begin_at_zero: true,
            series: vec![SeriesStyle::new(
                "Total Traded Quantity",
                Column::TotalTradedQuantity,
                Rgb(153, 102, 255),
            )],
        },
        MetricGroup {
            id: "marketCapChart".to_string(),
            title: "Market Capitalization".to_string(),
            kind: ChartKind::Line,
            y_axis_title: "Market Cap (in millions)".to_string(),
            begin_at_zero: true,
            series: vec![SeriesStyle::new(
                "Market Capitalization",
                Column::MarketCapitalization,
                Rgb(255, 159, 64),
            )],
        },
        MetricGroup {
            id: "highLowPricesChart".to_string(),
            title: "High vs Low Prices".to_string(),
            kind: ChartKind::Line,
            y_axis_title: "Price".to_string(),
            begin_at_zero: false,
            series: vec![
                SeriesStyle::new("High Price", Column::HighPrice, Rgb(255, 99, 132)),
                SeriesStyle::new("Low Price", Column::LowPrice, Rgb(54, 162, 235)),
            ],
        },
        MetricGroup {
            id: "priceValueChart".to_string(),
            title: "Price and Value Metrics".to_string(),
            kind: ChartKind::Bar,
            y_axis_title: "Price".to_string(),
            begin_at_zero: false,
            series: vec![
                SeriesStyle::new(
                    "Average Traded Price",
                    Column::AverageTradedPrice,
                    Rgb(255, 205, 86),
                ),
                SeriesStyle::new(
                    "Previous Day Close Price",
                    Column::PreviousDayClosePrice,
                    Rgb(75, 192, 192),
                ),
            ],
        },
    ]
}

// ============================================================================
// Chart.js-shaped configuration
// ============================================================================

/// Declarative configuration for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Canvas id; ignored by Chart.js itself.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// A labeled series. Missing observations serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<Observation>,
    pub border_color: String,
    pub background_color: String,
    pub border_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: ChartPlugins,
    pub scales: ChartScales,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPlugins {
    pub title: TitleOptions,
    pub legend: LegendOptions,
    pub tooltip: TooltipOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleOptions {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendOptions {
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipOptions {
    /// Decimal places shown for values.
    pub precision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartScales {
    pub x: AxisOptions,
    pub y: AxisOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisOptions {
    pub title: TitleOptions,
    #[serde(rename = "beginAtZero", skip_serializing_if = "Option::is_none", default)]
    pub begin_at_zero: Option<bool>,
}

impl ChartConfig {
    /// Legend title of the chart.
    pub fn title(&self) -> &str {
        &self.options.plugins.title.text
    }

    /// Number of x positions.
    pub fn point_count(&self) -> usize {
        self.data.labels.len()
    }

    /// Smallest and largest present value across all datasets.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values = self
            .data
            .datasets
            .iter()
            .flat_map(|d| d.data.iter().flatten().copied());
        values.fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

fn axis(text: &str, begin_at_zero: Option<bool>) -> AxisOptions {
    AxisOptions {
        title: TitleOptions {
            display: true,
            text: text.to_string(),
        },
        begin_at_zero,
    }
}

/// Build the chart for one group from a projected series.
pub fn build_chart(group: &MetricGroup, series: &CompanySeries) -> ChartConfig {
    let datasets = group
        .series
        .iter()
        .map(|style| ChartDataset {
            label: style.label.clone(),
            data: series.series(style.column).to_vec(),
            border_color: style.color.rgba(1.0),
            background_color: style.color.rgba(BACKGROUND_ALPHA),
            border_width: style
                .border_width
                .unwrap_or_else(|| group.kind.default_border_width()),
        })
        .collect();

    ChartConfig {
        id: group.id.clone(),
        kind: group.kind,
        data: ChartData {
            labels: series.labels.clone(),
            datasets,
        },
        options: ChartOptions {
            responsive: true,
            plugins: ChartPlugins {
                title: TitleOptions {
                    display: true,
                    text: format!("{}: {}", series.symbol, group.title),
                },
                legend: LegendOptions {
                    position: "top".to_string(),
                },
                tooltip: TooltipOptions { precision: 2 },
            },
            scales: ChartScales {
                x: axis("Date", None),
                y: axis(&group.y_axis_title, Some(group.begin_at_zero)),
            },
        },
    }
}

/// Build one chart per group, in group order.
pub fn build_charts(groups: &[MetricGroup], series: &CompanySeries) -> Vec<ChartConfig> {
    groups.iter().map(|g| build_chart(g, series)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse_csv_str, DataConfig};
    use crate::projection::{project, ProjectionOptions};

    fn abc_series() -> CompanySeries {
        let ds = parse_csv_str(
            "SYMBOL,BUSINESS_DATE,OPEN_PRICE,CLOSE_PRICE,TOTAL_TRADED_QUANTITY\n\
             ABC,2024-01-01,10.5,11.0,100\n\
             ABC,2024-01-02,11.0,10.8,\n",
            "mem",
            &DataConfig::default(),
        )
        .unwrap();
        project(&ds, "ABC", &ProjectionOptions::default()).unwrap()
    }

    #[test]
    fn test_default_groups() {
        let groups = default_groups();
        assert_eq!(groups.len(), 5);
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "stockPriceChart",
                "tradingVolumeChart",
                "marketCapChart",
                "highLowPricesChart",
                "priceValueChart"
            ]
        );
        assert!(groups.iter().all(|g| g.validate().is_ok()));
    }

    #[test]
    fn test_validate_rejects_text_column() {
        let mut group = default_groups().remove(0);
        group.series[0].column = Column::BusinessDate;
        assert!(group.validate().is_err());

        group.series.clear();
        assert!(group.validate().is_err());
    }

    #[test]
    fn test_build_price_chart() {
        let chart = build_chart(&default_groups()[0], &abc_series());
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.data.labels, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(chart.data.datasets.len(), 2);
        assert_eq!(chart.data.datasets[0].label, "Open Price");
        assert_eq!(chart.data.datasets[0].data, vec![Some(10.5), Some(11.0)]);
        assert_eq!(chart.data.datasets[1].data, vec![Some(11.0), Some(10.8)]);
        assert_eq!(chart.data.datasets[0].border_color, "rgba(75, 192, 192, 1)");
        assert_eq!(
            chart.data.datasets[0].background_color,
            "rgba(75, 192, 192, 0.2)"
        );
        assert_eq!(chart.data.datasets[0].border_width, 2);
        assert_eq!(chart.title(), "ABC: Stock Prices");
        assert_eq!(chart.value_range(), Some((10.5, 11.0)));
    }

    #[test]
    fn test_chart_json_shape() {
        let chart = build_chart(&default_groups()[1], &abc_series());
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["type"], "bar");
        assert_eq!(json["data"]["datasets"][0]["borderWidth"], 1);
        assert_eq!(json["data"]["datasets"][0]["data"][0], 100.0);
        assert!(json["data"]["datasets"][0]["data"][1].is_null());
        assert_eq!(json["options"]["scales"]["y"]["beginAtZero"], true);
        assert!(json["options"]["scales"]["x"].get("beginAtZero").is_none());
        assert_eq!(json["options"]["scales"]["x"]["title"]["text"], "Date");
        assert_eq!(json["options"]["plugins"]["legend"]["position"], "top");
    }

    #[test]
    fn test_rgb_formats() {
        let c = Rgb(255, 99, 132);
        assert_eq!(c.rgba(0.2), "rgba(255, 99, 132, 0.2)");
    }

    #[test]
    fn test_value_range_all_missing() {
        let mut chart = build_chart(&default_groups()[2], &abc_series());
        assert_eq!(chart.value_range(), None);
        chart.data.datasets.clear();
        assert_eq!(chart.value_range(), None);
    }
}
