// Kube-rs based Kubernetes client
pub mod kube_client;
pub mod kube_resources;
pub mod namespace_access_trait;
pub mod namespaces;

// Metrics backend clients
pub mod metrics_backend_trait;
pub mod prometheus_client;

#[cfg(test)]
pub mod testing;
