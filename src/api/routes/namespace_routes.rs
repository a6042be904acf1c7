//! Namespace-scoped routes (e.g., /api/v1/namespaces/*)

use axum::{routing::get, Router};

use crate::api::controller::metric::k8s::workload::K8sWorkloadMetricsController;
use crate::app_state::AppState;

/// Build the router for endpoints under /api/v1/namespaces
pub fn namespace_routes() -> Router<AppState> {
    Router::new()
        // Workloads
        .route(
            "/{namespace}/workloads/{workload}/metrics",
            get(K8sWorkloadMetricsController::get_metric_k8s_workload),
        )
}
