use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::metric::k8s::common::query_spec::MetricsQuerySpec;

/// Absolute window a set of expressions is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: TimeDelta,
}

impl TimeRange {
    pub fn from_spec(spec: &MetricsQuerySpec) -> Self {
        resolve_time_range(spec.query_time, spec.duration, spec.step)
    }
}

/// `end` is the query time and `start` lies `duration` before it.
///
/// Callers pass a validated positive `duration` whose start is representable;
/// out-of-range input saturates to the earliest representable instant.
pub fn resolve_time_range(
    query_time: DateTime<Utc>,
    duration: TimeDelta,
    step: TimeDelta,
) -> TimeRange {
    let start = query_time
        .checked_sub_signed(duration)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    TimeRange {
        start,
        end: query_time,
        step,
    }
}
