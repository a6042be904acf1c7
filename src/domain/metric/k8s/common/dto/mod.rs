//! Response DTOs for workload metrics

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::client::metrics_backend_trait::Series;
use crate::domain::metric::k8s::common::executor::ExpressionResult;

/// Series returned for one family, or one family/quantile pair.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSeriesDto {
    pub key: String,
    pub family: String,
    pub expression: String,
    pub is_histogram: bool,
    pub quantile: Option<f64>,
    pub series: Vec<Series>,
}

impl From<ExpressionResult> for MetricSeriesDto {
    fn from(result: ExpressionResult) -> Self {
        let ExpressionResult { expression, series } = result;
        Self {
            key: expression.key(),
            family: expression.family.to_string(),
            is_histogram: expression.is_histogram,
            quantile: expression.quantile,
            expression: expression.text,
            series,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadMetricsResponseDto {
    pub namespace: String,
    pub workload: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,
    pub series: Vec<MetricSeriesDto>,
}
