use thiserror::Error;
use tracing::warn;

use crate::core::client::namespace_access_trait::NamespaceAccessChecker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(String),
}

/// The caller may not read `namespace`. `cause` is for logs only.
#[derive(Debug, Clone, Error)]
#[error("access to namespace '{namespace}' is forbidden")]
pub struct AccessDeniedError {
    pub namespace: String,
    pub cause: String,
}

/// Ask the directory once whether `namespace` is readable.
pub async fn decide_namespace_access(
    checker: &dyn NamespaceAccessChecker,
    namespace: &str,
) -> AccessDecision {
    match checker.check_namespace_access(namespace).await {
        Ok(()) => AccessDecision::Allowed,
        Err(err) => AccessDecision::Denied(format!("{:#}", err)),
    }
}

pub async fn authorize_namespace(
    checker: &dyn NamespaceAccessChecker,
    namespace: &str,
) -> Result<(), AccessDeniedError> {
    match decide_namespace_access(checker, namespace).await {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied(cause) => {
            let err = AccessDeniedError {
                namespace: namespace.to_string(),
                cause,
            };
            warn!("Denied access to namespace '{}': {}", err.namespace, err.cause);
            Err(err)
        }
    }
}
