use anyhow::{Context, Result};
use kube::Client;
use tracing::debug;

/// Creates a Kubernetes client from the in-cluster service account or the
/// local kubeconfig, whichever is available.
pub async fn build_kube_client() -> Result<Client> {
    let client = Client::try_default()
        .await
        .context("failed to initialise Kubernetes client")?;

    debug!("Kubernetes client initialized successfully");
    Ok(client)
}
