use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::api::dto::metrics_dto::QueryParams;
use crate::config::MetricsConfig;
use crate::core::client::metrics_backend_trait::MetricsBackend;
use crate::core::client::namespace_access_trait::NamespaceAccessChecker;
use crate::domain::metric::k8s::common::access_guard::{authorize_namespace, AccessDeniedError};
use crate::domain::metric::k8s::common::catalog::eligible_families;
use crate::domain::metric::k8s::common::dto::{MetricSeriesDto, WorkloadMetricsResponseDto};
use crate::domain::metric::k8s::common::executor::{execute_expressions, BackendQueryError};
use crate::domain::metric::k8s::common::expression::{build_expressions, WorkloadTarget};
use crate::domain::metric::k8s::common::query_spec::{MetricsQuerySpec, ValidationError};
use crate::domain::metric::k8s::common::time_range::TimeRange;

#[derive(Debug, Error)]
pub enum WorkloadMetricsError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDeniedError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendQueryError),

    #[error("metrics backend did not answer within {0} second(s)")]
    Timeout(u64),
}

/// Metrics of one workload.
///
/// Namespace access is checked first; parameters are validated before any
/// backend query is issued.
pub async fn get_metric_k8s_workload(
    checker: &dyn NamespaceAccessChecker,
    backend: &dyn MetricsBackend,
    config: &MetricsConfig,
    namespace: String,
    workload: String,
    params: QueryParams,
) -> Result<WorkloadMetricsResponseDto, WorkloadMetricsError> {
    authorize_namespace(checker, &namespace).await?;

    let spec = MetricsQuerySpec::parse(&params, config, Utc::now()).inspect_err(|e| {
        debug!("Rejected query parameter '{}' for {}/{}: {}", e.parameter, namespace, workload, e)
    })?;
    let range = TimeRange::from_spec(&spec);

    let families = eligible_families(&spec.filters);
    let target = WorkloadTarget {
        namespace: &namespace,
        workload: &workload,
    };
    let expressions = build_expressions(config, target, &families, &spec);

    debug!(
        "Querying {} expression(s) for {}/{} over [{}, {}] step {}s",
        expressions.len(),
        namespace,
        workload,
        range.start,
        range.end,
        range.step.num_seconds()
    );

    let timeout = Duration::from_secs(config.query_timeout_secs);
    let results = tokio::time::timeout(timeout, execute_expressions(backend, expressions, &range))
        .await
        .map_err(|_| WorkloadMetricsError::Timeout(config.query_timeout_secs))??;

    Ok(WorkloadMetricsResponseDto {
        namespace,
        workload,
        start: range.start,
        end: range.end,
        step_seconds: range.step.num_seconds(),
        series: results.into_iter().map(MetricSeriesDto::from).collect(),
    })
}
