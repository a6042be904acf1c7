use anyhow::Result;
use async_trait::async_trait;

/// Answers whether the caller may read a namespace.
///
/// Any error means access is denied; the error is only used for logging.
#[async_trait]
pub trait NamespaceAccessChecker: Send + Sync {
    async fn check_namespace_access(&self, namespace: &str) -> Result<()>;
}
