//! Metrics routes (e.g., /api/v1/metrics/*)

use axum::{routing::get, Router};

use crate::api::controller::metric::k8s::workload::K8sWorkloadMetricsController;
use crate::app_state::AppState;

/// Build the router for metrics endpoints under /api/v1/metrics
pub fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/families", get(K8sWorkloadMetricsController::list_metric_families))
}
