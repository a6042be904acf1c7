//! Process-wide configuration, loaded once at startup.

use std::env;

use anyhow::{Context, Result};
use validator::Validate;

use crate::domain::metric::k8s::common::query_spec::RateInterval;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus.istio-system:9090";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Defaults and label names used when turning request parameters into queries.
#[derive(Debug, Clone, Validate)]
pub struct MetricsConfig {
    /// Window used inside rate functions when `rateInterval` is absent.
    #[validate(custom(function = "validate_rate_interval"))]
    pub default_rate_interval: String,

    /// How far back from `queryTime` the window extends when `duration` is absent.
    #[validate(range(min = 1))]
    pub default_duration_secs: i64,

    /// Sampling step when `step` is absent.
    #[validate(range(min = 1))]
    pub default_step_secs: i64,

    /// Upper bound for executing all backend queries of one request.
    #[validate(range(min = 1))]
    pub query_timeout_secs: u64,

    #[validate(length(min = 1))]
    pub workload_label: String,

    #[validate(length(min = 1))]
    pub namespace_label: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_rate_interval: "1m".to_string(),
            default_duration_secs: 1800,
            default_step_secs: 15,
            query_timeout_secs: 30,
            workload_label: "workload".to_string(),
            namespace_label: "namespace".to_string(),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub bind_addr: String,

    #[validate(url)]
    pub prometheus_url: String,

    pub log_dir: String,

    #[validate(nested)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Read configuration from `MESHLENS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MetricsConfig::default();
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let metrics = MetricsConfig {
            default_rate_interval: text(
                "MESHLENS_DEFAULT_RATE_INTERVAL",
                &defaults.default_rate_interval,
            ),
            default_duration_secs: parse_number(
                &lookup,
                "MESHLENS_DEFAULT_DURATION_SECS",
                defaults.default_duration_secs,
            )?,
            default_step_secs: parse_number(
                &lookup,
                "MESHLENS_DEFAULT_STEP_SECS",
                defaults.default_step_secs,
            )?,
            query_timeout_secs: parse_number(
                &lookup,
                "MESHLENS_QUERY_TIMEOUT_SECS",
                defaults.query_timeout_secs,
            )?,
            workload_label: text("MESHLENS_WORKLOAD_LABEL", &defaults.workload_label),
            namespace_label: text("MESHLENS_NAMESPACE_LABEL", &defaults.namespace_label),
        };

        let config = AppConfig {
            bind_addr: text("MESHLENS_BIND_ADDR", DEFAULT_BIND_ADDR),
            prometheus_url: text("MESHLENS_PROMETHEUS_URL", DEFAULT_PROMETHEUS_URL),
            log_dir: text("MESHLENS_LOG_DIR", DEFAULT_LOG_DIR),
            metrics,
        };

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}

#[allow(clippy::ptr_arg)]
fn validate_rate_interval(value: &String) -> Result<(), validator::ValidationError> {
    RateInterval::parse(value)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("rate_interval"))
}
