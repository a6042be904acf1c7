use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::{Api, Client};
use tracing::debug;

use crate::core::client::kube_resources::Namespace;
use crate::core::client::namespace_access_trait::NamespaceAccessChecker;

/// Fetch a single namespace by name
pub async fn fetch_namespace_by_name(client: &Client, name: &str) -> Result<Namespace> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let namespace = namespaces
        .get(name)
        .await
        .with_context(|| format!("failed to read namespace '{}'", name))?;

    debug!("Fetched namespace: {}", name);
    Ok(namespace)
}

/// Grants access to a namespace when the service account can read it.
#[derive(Clone)]
pub struct KubeNamespaceAccessChecker {
    client: Client,
}

impl KubeNamespaceAccessChecker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NamespaceAccessChecker for KubeNamespaceAccessChecker {
    async fn check_namespace_access(&self, namespace: &str) -> Result<()> {
        fetch_namespace_by_name(&self.client, namespace).await.map(|_| ())
    }
}
