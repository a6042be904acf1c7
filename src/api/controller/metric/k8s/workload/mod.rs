use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::dto::{metrics_dto::QueryParams, ApiResponse};
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::metric::k8s::common::catalog::MetricFamily;
use crate::domain::metric::k8s::common::dto::WorkloadMetricsResponseDto;
use crate::errors::AppError;

pub struct K8sWorkloadMetricsController;

impl K8sWorkloadMetricsController {
    pub async fn get_metric_k8s_workload(
        State(state): State<AppState>,
        Path((namespace, workload)): Path<(String, String)>,
        Query(pairs): Query<Vec<(String, String)>>,
    ) -> Result<Json<ApiResponse<WorkloadMetricsResponseDto>>, AppError> {
        to_json(
            state
                .metric_service
                .get_metric_k8s_workload(namespace, workload, QueryParams::from(pairs))
                .await,
        )
    }

    pub async fn list_metric_families(
        State(state): State<AppState>,
    ) -> Json<ApiResponse<&'static [MetricFamily]>> {
        Json(ApiResponse::ok(state.metric_service.list_metric_families()))
    }
}
