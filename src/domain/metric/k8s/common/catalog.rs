//! Static catalog of the sub-metric families known for a workload.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricFamily {
    /// Name used in the `filters[]` parameter and in responses.
    pub name: &'static str,
    /// Backend metric the family reads from.
    pub metric: &'static str,
    /// Whether the metric is a histogram, exposing `<metric>_bucket`, `_sum`
    /// and `_count` series instead of a bare `<metric>` series.
    pub is_histogram: bool,
    /// Matcher appended after the workload/namespace matchers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_matcher: Option<&'static str>,
}

/// All families, in the order their expressions are emitted.
pub const METRIC_FAMILIES: &[MetricFamily] = &[
    MetricFamily {
        name: "request_count",
        metric: "istio_requests_total",
        is_histogram: false,
        extra_matcher: None,
    },
    MetricFamily {
        name: "request_error_count",
        metric: "istio_requests_total",
        is_histogram: false,
        extra_matcher: Some(r##"response_code=~"[45].."##),
    },
    MetricFamily {
        name: "request_duration",
        metric: "istio_request_duration_seconds",
        is_histogram: true,
        extra_matcher: None,
    },
    MetricFamily {
        name: "request_size",
        metric: "istio_request_bytes",
        is_histogram: true,
        extra_matcher: None,
    },
    MetricFamily {
        name: "response_size",
        metric: "istio_response_bytes",
        is_histogram: true,
        extra_matcher: None,
    },
    MetricFamily {
        name: "tcp_received",
        metric: "istio_tcp_received_bytes_total",
        is_histogram: false,
        extra_matcher: None,
    },
    MetricFamily {
        name: "tcp_sent",
        metric: "istio_tcp_sent_bytes_total",
        is_histogram: false,
        extra_matcher: None,
    },
];

/// Families selected by `filters`; an empty filter list selects all of them.
/// Unknown names select nothing.
pub fn eligible_families(filters: &[String]) -> Vec<&'static MetricFamily> {
    METRIC_FAMILIES
        .iter()
        .filter(|f| filters.is_empty() || filters.iter().any(|name| name == f.name))
        .collect()
}
