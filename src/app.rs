//! Service startup and composition
//!
//! Startup order: load config, connect to the cluster, run the first poll
//! cycle, bind the HTTP listener, then serve and poll concurrently.

use crate::cluster::{self, ClusterError};
use crate::config::{load_configuration, ConfigError, Configuration};
use crate::poller::{KubePodLister, PodLister, PollError, StatusPoller};
use crate::server::{self, create_metrics, AppState};
use crate::settings::Settings;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error creating Kubernetes client: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Error polling pod status: {0}")]
    Poll(#[from] PollError),

    #[error("Error starting the server: {0}")]
    Server(#[source] std::io::Error),

    #[error("Pod status poller stopped unexpectedly: {0}")]
    PollerTask(String),
}

/// Run the service until a fatal error
///
/// Never returns `Ok` in practice: the server and poller run forever.
pub async fn run(settings: Settings) -> Result<(), AppError> {
    let config = load_configuration(&settings.config_path)?;
    info!(
        path = %settings.config_path.display(),
        version = %config.version,
        "Configuration loaded"
    );

    if !settings.cluster_aware {
        info!("Cluster-aware mode disabled, serving greeting only");
        return serve_basic(&settings, config).await;
    }

    let client = cluster::connect().await?;
    run_cluster_aware(&settings, config, KubePodLister::new(client)).await
}

/// Serve the greeting alone: no poller, no `/metrics`
pub async fn serve_basic(settings: &Settings, config: Configuration) -> Result<(), AppError> {
    let listener = server::bind(settings.port).await.map_err(AppError::Server)?;
    server::serve(listener, AppState::new(config))
        .await
        .map_err(AppError::Server)
}

/// Serve the greeting and metrics while polling pods through `lister`
///
/// The first poll cycle completes before the listener binds, so a listing
/// failure under `FailurePolicy::Exit` ends startup with the port closed.
/// Afterwards the first of server or poller to fail ends the run.
pub async fn run_cluster_aware<L>(
    settings: &Settings,
    config: Configuration,
    lister: L,
) -> Result<(), AppError>
where
    L: PodLister + 'static,
{
    let metrics = create_metrics()?;
    let poller = StatusPoller::new(
        lister,
        settings.poll_target.clone(),
        settings.poll_interval,
        settings.failure_policy,
        metrics.clone(),
    );

    poller.tick().await?;

    let listener = server::bind(settings.port).await.map_err(AppError::Server)?;
    let state = AppState::new(config).with_metrics(metrics);

    let mut poll_task = tokio::spawn(poller.run());

    tokio::select! {
        res = server::serve(listener, state) => {
            poll_task.abort();
            res.map_err(AppError::Server)
        }
        res = &mut poll_task => match res {
            Ok(Ok(never)) => match never {},
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(AppError::PollerTask(e.to_string())),
        },
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
