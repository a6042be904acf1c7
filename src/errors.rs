use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::metric::k8s::workload::service::WorkloadMetricsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Metrics backend error: {0}")]
    MetricsBackendError(String),

    #[error("Metrics backend timeout: {0}")]
    MetricsBackendTimeout(String),
}

impl From<WorkloadMetricsError> for AppError {
    fn from(err: WorkloadMetricsError) -> Self {
        match err {
            WorkloadMetricsError::Validation(e) => AppError::BadRequest(e.to_string()),
            // The directory's own error was logged by the access guard.
            WorkloadMetricsError::AccessDenied(e) => AppError::Forbidden(e.to_string()),
            WorkloadMetricsError::Backend(e) => AppError::MetricsBackendError(e.to_string()),
            WorkloadMetricsError::Timeout(secs) => {
                AppError::MetricsBackendTimeout(format!("no answer within {secs} second(s)"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Choose status codes per variant
        let status = match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MetricsBackendError(_) => StatusCode::BAD_GATEWAY,
            AppError::MetricsBackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        // String provided by thiserror → safe JSON message
        let body = Json(json!({
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
