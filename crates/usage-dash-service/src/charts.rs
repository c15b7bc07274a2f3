//! Line chart descriptors.
//!
//! Each aggregated series yields three charts (cost, tokens, requests), six
//! in total. A descriptor carries everything a renderer needs: titles, axis
//! labels, a color and the `(x, y)` points.

use chrono::{DateTime, Utc};
use serde::Serialize;
use usage_dash_core::{AggregatedBucket, AggregatedUsage, Granularity};

/// Tick label format for the date axis.
pub const DATE_TICK_FORMAT: &str = "%Y-%m-%d";

/// A charted measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Summed cost.
    Cost,
    /// Summed tokens.
    TotalTokens,
    /// Request count.
    ApiRequests,
}

impl Measure {
    /// Measures in dashboard order.
    pub const ALL: [Self; 3] = [Self::Cost, Self::TotalTokens, Self::ApiRequests];

    fn slug(self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::TotalTokens => "tokens",
            Self::ApiRequests => "requests",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Cost => "Cost",
            Self::TotalTokens => "Total Tokens",
            Self::ApiRequests => "API Requests",
        }
    }

    fn y_axis_title(self) -> &'static str {
        match self {
            Self::Cost => "Cost ($)",
            Self::TotalTokens => "Total Tokens",
            Self::ApiRequests => "Number of Requests",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Cost => "firebrick",
            Self::TotalTokens => "royalblue",
            Self::ApiRequests => "green",
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn value(self, bucket: &AggregatedBucket) -> f64 {
        match self {
            Self::Cost => bucket.total_cost,
            Self::TotalTokens => bucket.total_tokens,
            Self::ApiRequests => bucket.api_requests as f64,
        }
    }
}

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Bucket start.
    pub x: DateTime<Utc>,
    /// Measure value.
    pub y: f64,
}

/// A renderable line chart.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    /// Stable element ID, e.g. `daily-cost`.
    pub id: String,
    /// Chart title, e.g. `Daily Cost`.
    pub title: String,
    /// Series name for the legend.
    pub series_name: &'static str,
    /// Bucket granularity.
    pub granularity: Granularity,
    /// Charted measure.
    pub measure: Measure,
    /// X axis label.
    pub x_axis_title: &'static str,
    /// Y axis label.
    pub y_axis_title: &'static str,
    /// Date tick format for the x axis.
    pub x_tick_format: &'static str,
    /// Line and marker color.
    pub color: &'static str,
    /// Points in ascending `x` order.
    pub points: Vec<ChartPoint>,
}

/// Build one chart for a series and measure.
#[must_use]
pub fn chart(granularity: Granularity, measure: Measure, buckets: &[AggregatedBucket]) -> Chart {
    let period = match granularity {
        Granularity::Daily => "Daily",
        Granularity::Weekly => "Weekly",
    };

    Chart {
        id: format!("{}-{}", granularity.as_str(), measure.slug()),
        title: format!("{period} {}", measure.title()),
        series_name: measure.title(),
        granularity,
        measure,
        x_axis_title: "Date",
        y_axis_title: measure.y_axis_title(),
        x_tick_format: DATE_TICK_FORMAT,
        color: measure.color(),
        points: buckets
            .iter()
            .map(|bucket| ChartPoint {
                x: bucket.bucket_start,
                y: measure.value(bucket),
            })
            .collect(),
    }
}

/// Build the six dashboard charts: daily then weekly, each cost, tokens, requests.
#[must_use]
pub fn build_charts(usage: &AggregatedUsage) -> Vec<Chart> {
    [Granularity::Daily, Granularity::Weekly]
        .into_iter()
        .flat_map(|granularity| {
            Measure::ALL
                .into_iter()
                .map(move |measure| chart(granularity, measure, usage.series(granularity)))
        })
        .collect()
}
