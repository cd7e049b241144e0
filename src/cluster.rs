//! Kubernetes client construction
//!
//! Credentials are discovered from an ordered chain of sources:
//! 1. In-cluster service account
//! 2. Kubeconfig file named by `KUBECONFIG`
//!
//! The first source that yields a config wins.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the fallback kubeconfig file
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Default discovery chain
pub const DEFAULT_SOURCES: [CredentialSource; 2] =
    [CredentialSource::InCluster, CredentialSource::KubeconfigEnv];

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("In-cluster configuration unavailable: {0}")]
    InCluster(String),

    #[error("KUBECONFIG is not set")]
    KubeconfigUnset,

    #[error("Failed to load kubeconfig {path}: {reason}")]
    Kubeconfig { path: String, reason: String },

    #[error("No Kubernetes credentials found ({0})")]
    Exhausted(String),

    #[error("Failed to create Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// A place Kubernetes credentials can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service account token and CA mounted into the pod
    InCluster,
    /// Kubeconfig file at the path in `KUBECONFIG`
    KubeconfigEnv,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::InCluster => f.write_str("in-cluster"),
            CredentialSource::KubeconfigEnv => f.write_str("kubeconfig"),
        }
    }
}

impl CredentialSource {
    /// Load a client config from this source using the process environment
    pub async fn load(self) -> Result<Config, ClusterError> {
        self.load_with(|key| std::env::var(key).ok()).await
    }

    /// Load a client config, reading environment variables through `lookup`
    ///
    /// `lookup` only affects `KubeconfigEnv`; the in-cluster loader reads the
    /// service account environment itself.
    pub async fn load_with<F>(self, lookup: F) -> Result<Config, ClusterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            CredentialSource::InCluster => {
                Config::incluster().map_err(|e| ClusterError::InCluster(e.to_string()))
            }
            CredentialSource::KubeconfigEnv => {
                let path = lookup(KUBECONFIG_ENV)
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(ClusterError::KubeconfigUnset)?;

                let kubeconfig =
                    Kubeconfig::read_from(&path).map_err(|e| ClusterError::Kubeconfig {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;

                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| ClusterError::Kubeconfig {
                        path,
                        reason: e.to_string(),
                    })
            }
        }
    }
}

/// Try each source in order and return the first config found
///
/// # Returns
/// * `Ok((source, config))` - the source that succeeded and its config
/// * `Err(ClusterError::Exhausted)` - every source failed
pub async fn discover_config(
    sources: &[CredentialSource],
) -> Result<(CredentialSource, Config), ClusterError> {
    discover_config_with(sources, |key| std::env::var(key).ok()).await
}

/// Same as `discover_config`, reading environment variables through `lookup`
pub async fn discover_config_with<F>(
    sources: &[CredentialSource],
    lookup: F,
) -> Result<(CredentialSource, Config), ClusterError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut failures = Vec::with_capacity(sources.len());

    for &source in sources {
        match source.load_with(&lookup).await {
            Ok(config) => {
                debug!(source = %source, cluster_url = %config.cluster_url, "Loaded Kubernetes config");
                return Ok((source, config));
            }
            Err(e) => {
                debug!(source = %source, error = %e, "Kubernetes credential source unavailable");
                failures.push(format!("{}: {}", source, e));
            }
        }
    }

    Err(ClusterError::Exhausted(failures.join("; ")))
}

/// Build a client from the first working credential source
pub async fn connect() -> Result<Client, ClusterError> {
    connect_with(|key| std::env::var(key).ok()).await
}

/// Same as `connect`, reading environment variables through `lookup`
pub async fn connect_with<F>(lookup: F) -> Result<Client, ClusterError>
where
    F: Fn(&str) -> Option<String>,
{
    let (source, config) = discover_config_with(&DEFAULT_SOURCES, lookup).await?;
    let client = Client::try_from(config)?;
    info!(source = %source, "Connected to Kubernetes cluster");
    Ok(client)
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
