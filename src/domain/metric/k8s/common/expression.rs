//! Builds backend query expressions for a workload.
//!
//! Pure string construction over already-validated input; nothing here
//! talks to the backend.

use serde::Serialize;
use tracing::debug;

use crate::config::MetricsConfig;
use crate::domain::metric::k8s::common::catalog::MetricFamily;
use crate::domain::metric::k8s::common::query_spec::MetricsQuerySpec;

/// Bucket boundary label of histogram series.
const BUCKET_LABEL: &str = "le";

#[derive(Debug, Clone, Copy)]
pub struct WorkloadTarget<'a> {
    pub namespace: &'a str,
    pub workload: &'a str,
}

/// One rendered query for a family, or for a family and quantile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub family: &'static str,
    pub text: String,
    pub is_histogram: bool,
    /// Present exactly when `is_histogram` is set.
    pub quantile: Option<f64>,
}

impl Expression {
    fn counter(family: &'static str, text: String) -> Self {
        Self {
            family,
            text,
            is_histogram: false,
            quantile: None,
        }
    }

    fn histogram(family: &'static str, quantile: f64, text: String) -> Self {
        Self {
            family,
            text,
            is_histogram: true,
            quantile: Some(quantile),
        }
    }

    /// Stable identifier of the family/quantile pair, e.g. `request_size@0.95`.
    pub fn key(&self) -> String {
        match self.quantile {
            Some(q) => format!("{}@{}", self.family, q),
            None => self.family.to_string(),
        }
    }
}

/// Expressions for every family in `families`, in that order.
///
/// Histogram families yield one expression per requested quantile, or the
/// mean observation (`_sum` rate over `_count` rate) when no quantile is
/// requested. Counter families yield a single rate expression.
pub fn build_expressions(
    config: &MetricsConfig,
    target: WorkloadTarget<'_>,
    families: &[&MetricFamily],
    spec: &MetricsQuerySpec,
) -> Vec<Expression> {
    let mut expressions = Vec::new();

    for family in families {
        let selector = series_selector(config, target, family);

        if family.is_histogram && !spec.quantiles.is_empty() {
            let bucket_selector = format!("{}_bucket{}", family.metric, selector);
            let rate = rate_of(spec, &bucket_selector);
            let grouping = std::iter::once(BUCKET_LABEL)
                .chain(spec.by_labels.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(",");

            for &q in &spec.quantiles {
                let text = format!("histogram_quantile({q}, sum({rate}) by ({grouping}))");
                expressions.push(Expression::histogram(family.name, q, text));
            }
        } else if family.is_histogram {
            let sum = summed_rate(spec, &format!("{}_sum{}", family.metric, selector));
            let count = summed_rate(spec, &format!("{}_count{}", family.metric, selector));
            expressions.push(Expression::counter(family.name, format!("{sum} / {count}")));
        } else {
            let text = summed_rate(spec, &format!("{}{}", family.metric, selector));
            expressions.push(Expression::counter(family.name, text));
        }
    }

    debug!(
        "Built {} expression(s) for {}/{}",
        expressions.len(),
        target.namespace,
        target.workload
    );
    expressions
}

/// `sum(rate(<series>[5m])) by (<labels>)`, without the clause when no
/// grouping labels were requested.
fn summed_rate(spec: &MetricsQuerySpec, series: &str) -> String {
    let mut text = format!("sum({})", rate_of(spec, series));
    if !spec.by_labels.is_empty() {
        text.push_str(&format!(" by ({})", spec.by_labels.join(",")));
    }
    text
}

/// `rate(<series>[5m])`
fn rate_of(spec: &MetricsQuerySpec, series: &str) -> String {
    format!("{}({}[{}])", spec.rate_func, series, spec.rate_interval)
}

/// `{workload="w",namespace="ns"}` plus the family's extra matcher.
fn series_selector(config: &MetricsConfig, target: WorkloadTarget<'_>, family: &MetricFamily) -> String {
    let mut matchers = vec![
        format!(
            "{}=\"{}\"",
            config.workload_label,
            escape_label_value(target.workload)
        ),
        format!(
            "{}=\"{}\"",
            config.namespace_label,
            escape_label_value(target.namespace)
        ),
    ];
    if let Some(extra) = family.extra_matcher {
        matchers.push(extra.to_string());
    }
    format!("{{{}}}", matchers.join(","))
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
