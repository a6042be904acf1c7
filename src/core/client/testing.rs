//! In-memory collaborators for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::core::client::metrics_backend_trait::{MetricsBackend, Sample, Series};
use crate::core::client::namespace_access_trait::NamespaceAccessChecker;
use crate::domain::metric::k8s::common::catalog::METRIC_FAMILIES;
use crate::domain::metric::k8s::common::time_range::TimeRange;

/// Allows a fixed set of namespaces and records every lookup.
#[derive(Default)]
pub struct MockAccessChecker {
    allowed: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockAccessChecker {
    pub fn allowing(namespaces: &[&str]) -> Self {
        Self {
            allowed: namespaces.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NamespaceAccessChecker for MockAccessChecker {
    async fn check_namespace_access(&self, namespace: &str) -> Result<()> {
        self.calls.lock().unwrap().push(namespace.to_string());
        if self.allowed.iter().any(|n| n == namespace) {
            Ok(())
        } else {
            Err(anyhow!("no privileges"))
        }
    }
}

/// Records every query and answers with one series labelled by the query.
///
/// Malformed queries are rejected the way the backend's parser would reject
/// them (see [`check_expression_shape`]). Queries containing `fail_on` error out; `delay_for` lets tests make
/// earlier queries finish last.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<(String, TimeRange)>>,
    completed: AtomicUsize,
    fail_on: Vec<String>,
    delay_for: Option<Box<dyn Fn(&str) -> Duration + Send + Sync>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(patterns: &[&str]) -> Self {
        Self {
            fail_on: patterns.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(delay_for: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        Self {
            delay_for: Some(Box::new(delay_for)),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsBackend for MockBackend {
    async fn query_range(&self, expression: &str, range: &TimeRange) -> Result<Vec<Series>> {
        self.calls
            .lock()
            .unwrap()
            .push((expression.to_string(), *range));

        check_expression_shape(expression).map_err(|reason| anyhow!("parse error: {reason}"))?;

        if let Some(delay_for) = &self.delay_for {
            tokio::time::sleep(delay_for(expression)).await;
        }

        if self.fail_on.iter().any(|p| expression.contains(p.as_str())) {
            return Err(anyhow!("backend unavailable"));
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Series {
            labels: [("query".to_string(), expression.to_string())].into(),
            samples: vec![Sample {
                timestamp: range.end.timestamp() as f64,
                value: 1.0,
            }],
        }])
    }
}

/// Structural check of a rendered expression: strings are closed, brackets
/// nest, and every `{...}` selector names a series the catalog exposes.
pub fn check_expression_shape(text: &str) -> Result<(), String> {
    let chars: Vec<char> = text.chars().collect();
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                let name: String = chars[..i]
                    .iter()
                    .rev()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_' || **c == ':')
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                if !is_catalog_series(&name) {
                    return Err(format!("selector at {i} reads unknown series `{name}`"));
                }
                open.push(c);
            }
            '(' | '[' => open.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return Err(format!("unbalanced `{c}` at {i}"));
                }
            }
            _ => {}
        }
    }

    if in_string {
        return Err("unterminated string".to_string());
    }
    if let Some(c) = open.last() {
        return Err(format!("unclosed `{c}`"));
    }
    Ok(())
}

/// Counters are read as is; histograms only through their suffixed series.
fn is_catalog_series(name: &str) -> bool {
    METRIC_FAMILIES.iter().any(|f| {
        if f.is_histogram {
            ["_bucket", "_sum", "_count"]
                .iter()
                .any(|suffix| name.strip_suffix(suffix) == Some(f.metric))
        } else {
            name == f.metric
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_check_accepts_selectors_with_escaped_values() {
        let text = r#"histogram_quantile(0.5, sum(rate(istio_request_bytes_bucket{workload="a\"{b",namespace="ns"}[1m])) by (le))"#;
        assert_eq!(check_expression_shape(text), Ok(()));
    }

    #[test]
    fn shape_check_rejects_unterminated_matcher() {
        let text = r#"sum(rate(istio_requests_total{workload="w",response_code=~"[45]..}[1m]))"#;
        assert!(check_expression_shape(text).is_err());
    }

    #[test]
    fn shape_check_rejects_bare_histogram_series() {
        let text = r#"sum(rate(istio_request_bytes{workload="w"}[1m]))"#;
        let err = check_expression_shape(text).unwrap_err();
        assert!(err.contains("istio_request_bytes"), "{err}");
    }

    #[test]
    fn shape_check_rejects_unbalanced_brackets() {
        assert!(check_expression_shape(r#"sum(rate(istio_requests_total{workload="w"}[1m])"#).is_err());
        assert!(check_expression_shape(r#"sum(rate(istio_requests_total{workload="w"}[1m)))"#).is_err());
    }

    #[tokio::test]
    async fn backend_rejects_malformed_queries() {
        let backend = MockBackend::new();
        let end = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let range = crate::domain::metric::k8s::common::time_range::resolve_time_range(
            end,
            chrono::TimeDelta::minutes(30),
            chrono::TimeDelta::seconds(15),
        );

        let err = backend
            .query_range(r#"sum(rate(istio_requests_total{workload="w}[1m]))"#, &range)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("parse error"));
        assert_eq!(backend.completed(), 0);
    }
}
