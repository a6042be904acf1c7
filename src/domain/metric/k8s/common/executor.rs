use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::client::metrics_backend_trait::{MetricsBackend, Series};
use crate::domain::metric::k8s::common::expression::Expression;
use crate::domain::metric::k8s::common::time_range::TimeRange;

/// At least one backend query of a request failed. Carries the first failing
/// expression; the others are logged.
#[derive(Debug, Clone, Error)]
#[error("metrics backend query failed for {failed} of {total} expression(s), first `{expression}`: {cause}")]
pub struct BackendQueryError {
    pub expression: String,
    pub cause: String,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ExpressionResult {
    pub expression: Expression,
    pub series: Vec<Series>,
}

/// Run every expression concurrently over `range`.
///
/// Results come back in the order of `expressions` regardless of completion
/// order. Any failure fails the whole batch.
pub async fn execute_expressions(
    backend: &dyn MetricsBackend,
    expressions: Vec<Expression>,
    range: &TimeRange,
) -> Result<Vec<ExpressionResult>, BackendQueryError> {
    let outcomes = join_all(
        expressions
            .iter()
            .map(|e| backend.query_range(&e.text, range)),
    )
    .await;

    let total = outcomes.len();
    let mut results = Vec::with_capacity(total);
    let mut first_failure: Option<(String, String)> = None;
    let mut failed = 0;

    for (expression, outcome) in expressions.into_iter().zip(outcomes) {
        match outcome {
            Ok(series) => {
                debug!("{} returned {} series", expression.key(), series.len());
                results.push(ExpressionResult { expression, series });
            }
            Err(err) => {
                failed += 1;
                warn!("Backend query failed for `{}`: {:#}", expression.text, err);
                if first_failure.is_none() {
                    first_failure = Some((expression.text, format!("{:#}", err)));
                }
            }
        }
    }

    if let Some((expression, cause)) = first_failure {
        return Err(BackendQueryError {
            expression,
            cause,
            failed,
            total,
        });
    }

    Ok(results)
}
