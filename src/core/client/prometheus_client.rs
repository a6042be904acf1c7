//! Prometheus HTTP API adapter for range queries.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::client::metrics_backend_trait::{MetricsBackend, Sample, Series};
use crate::domain::metric::k8s::common::time_range::TimeRange;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromResponse {
    status: String,
    data: Option<PromData>,
    error_type: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromData {
    result_type: String,
    #[serde(default)]
    result: Vec<PromSeries>,
}

#[derive(Debug, Deserialize)]
struct PromSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

#[derive(Clone)]
pub struct PrometheusClient {
    http: Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn query_range(&self, expression: &str, range: &TimeRange) -> Result<Vec<Series>> {
        let url = format!("{}/api/v1/query_range", self.base_url);
        let params = [
            ("query", expression.to_string()),
            ("start", range.start.timestamp().to_string()),
            ("end", range.end.timestamp().to_string()),
            ("step", range.step.num_seconds().to_string()),
        ];

        debug!("Querying Prometheus: {}", expression);

        let resp = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to call Prometheus (url={})", url))?;

        // Prometheus reports query errors as JSON with a non-2xx status,
        // so the body is decoded either way.
        let status = resp.status();
        let body: PromResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to decode Prometheus response (status={})", status))?;

        decode_matrix(body)
    }
}

fn decode_matrix(body: PromResponse) -> Result<Vec<Series>> {
    if body.status != "success" {
        return Err(anyhow!(
            "Prometheus returned {}: {}",
            body.error_type.as_deref().unwrap_or("error"),
            body.error.as_deref().unwrap_or("no error message")
        ));
    }

    let data = body
        .data
        .ok_or_else(|| anyhow!("Prometheus response has no data"))?;
    if data.result_type != "matrix" {
        return Err(anyhow!(
            "expected a matrix result from Prometheus, got '{}'",
            data.result_type
        ));
    }

    data.result
        .into_iter()
        .map(|s| {
            let samples = s
                .values
                .into_iter()
                .map(|(timestamp, raw)| {
                    raw.parse::<f64>()
                        .map(|value| Sample { timestamp, value })
                        .with_context(|| format!("invalid sample value '{}'", raw))
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Series {
                labels: s.metric,
                samples,
            })
        })
        .collect()
}
