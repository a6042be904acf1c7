use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::api::dto::metrics_dto::QueryParams;
use crate::config::{AppConfig, MetricsConfig};
use crate::core::client::metrics_backend_trait::MetricsBackend;
use crate::core::client::namespace_access_trait::NamespaceAccessChecker;
use crate::core::client::namespaces::KubeNamespaceAccessChecker;
use crate::core::client::prometheus_client::PrometheusClient;
use crate::domain::metric::k8s::common::catalog::{MetricFamily, METRIC_FAMILIES};
use crate::domain::metric::k8s::common::dto::WorkloadMetricsResponseDto;
use crate::domain::metric::k8s::workload::service::WorkloadMetricsError;

#[derive(Clone)]
pub struct AppState {
    pub metric_service: Arc<MetricService>,
}

pub fn build_app_state(config: &AppConfig, kube_client: kube::Client) -> Result<AppState> {
    let prometheus = PrometheusClient::new(
        &config.prometheus_url,
        Duration::from_secs(config.metrics.query_timeout_secs),
    )?;

    Ok(AppState {
        metric_service: Arc::new(MetricService::new(
            Arc::new(KubeNamespaceAccessChecker::new(kube_client)),
            Arc::new(prometheus),
            config.metrics.clone(),
        )),
    })
}

/// Holds the process-lifetime collaborators the metrics endpoints query.
pub struct MetricService {
    access_checker: Arc<dyn NamespaceAccessChecker>,
    backend: Arc<dyn MetricsBackend>,
    config: MetricsConfig,
}

impl MetricService {
    pub fn new(
        access_checker: Arc<dyn NamespaceAccessChecker>,
        backend: Arc<dyn MetricsBackend>,
        config: MetricsConfig,
    ) -> Self {
        Self {
            access_checker,
            backend,
            config,
        }
    }

    pub async fn get_metric_k8s_workload(
        &self,
        namespace: String,
        workload: String,
        params: QueryParams,
    ) -> Result<WorkloadMetricsResponseDto, WorkloadMetricsError> {
        crate::domain::metric::k8s::workload::service::get_metric_k8s_workload(
            self.access_checker.as_ref(),
            self.backend.as_ref(),
            &self.config,
            namespace,
            workload,
            params,
        )
        .await
    }

    pub fn list_metric_families(&self) -> &'static [MetricFamily] {
        METRIC_FAMILIES
    }
}
