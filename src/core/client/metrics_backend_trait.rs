use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::metric::k8s::common::time_range::TimeRange;

/// One sample of a series; non-finite values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub labels: BTreeMap<String, String>,
    pub samples: Vec<Sample>,
}

/// Executes range queries against a time-series store.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn query_range(&self, expression: &str, range: &TimeRange) -> Result<Vec<Series>>;
}
