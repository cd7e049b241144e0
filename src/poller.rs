//! Periodic pod status polling
//!
//! Lists the pods matching a namespace and label selector on a fixed cadence
//! and logs whether each one is in the `Running` phase.
//!
//! The `hello_app_pod_status` gauge is registered by the metrics module but
//! is never written here: it always reports 0.

use crate::server::SharedMetrics;
use crate::settings::{DEFAULT_LABEL_SELECTOR, DEFAULT_NAMESPACE};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Phase reported by a pod whose containers are up
pub const POD_RUNNING: &str = "Running";

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Failed to list pods in namespace {namespace} ({selector}): {source}")]
    ListPods {
        namespace: String,
        selector: String,
        #[source]
        source: kube::Error,
    },
}

/// Source of pods for the poller
///
/// Production uses `KubePodLister`; tests substitute canned responses.
#[async_trait]
pub trait PodLister: Send + Sync {
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> kube::Result<Vec<Pod>>;
}

/// Lists pods through the Kubernetes API
#[derive(Clone)]
pub struct KubePodLister {
    client: Client,
}

impl KubePodLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodLister for KubePodLister {
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> kube::Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items)
    }
}

/// Namespace and label selector identifying the polled pods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub namespace: String,
    pub label_selector: String,
}

impl Default for PollTarget {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
        }
    }
}

/// What a failed poll cycle does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop polling and surface the error, terminating the process
    #[default]
    Exit,
    /// Log the error and try again on the next cycle
    Retry,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exit" => Ok(Self::Exit),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown failure policy {other:?} (expected exit or retry)")),
        }
    }
}

/// Running classification of a single pod
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodState {
    Running,
    NotRunning,
}

impl fmt::Display for PodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodState::Running => f.write_str("running"),
            PodState::NotRunning => f.write_str("not running"),
        }
    }
}

/// Classify a pod by its reported phase
///
/// A pod without status or phase is not running.
pub fn classify(pod: &Pod) -> PodState {
    let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
    if phase == Some(POD_RUNNING) {
        PodState::Running
    } else {
        PodState::NotRunning
    }
}

/// Outcome for one pod in a poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodReport {
    pub name: String,
    pub state: PodState,
}

/// Run one poll cycle: list matching pods and log each classification
pub async fn poll_once(
    lister: &dyn PodLister,
    target: &PollTarget,
) -> Result<Vec<PodReport>, PollError> {
    let pods = lister
        .list_pods(&target.namespace, &target.label_selector)
        .await
        .map_err(|source| PollError::ListPods {
            namespace: target.namespace.clone(),
            selector: target.label_selector.clone(),
            source,
        })?;

    debug!(
        namespace = %target.namespace,
        selector = %target.label_selector,
        count = pods.len(),
        "Listed pods"
    );

    let reports = pods
        .iter()
        .map(|pod| {
            let report = PodReport {
                name: pod.name_any(),
                state: classify(pod),
            };
            match report.state {
                PodState::Running => info!(pod = %report.name, "Pod is running"),
                PodState::NotRunning => info!(pod = %report.name, "Pod is not running"),
            }
            report
        })
        .collect();

    Ok(reports)
}

/// Background pod status poller
pub struct StatusPoller<L> {
    lister: L,
    target: PollTarget,
    interval: Duration,
    policy: FailurePolicy,
    metrics: SharedMetrics,
}

impl<L: PodLister> StatusPoller<L> {
    pub fn new(
        lister: L,
        target: PollTarget,
        interval: Duration,
        policy: FailurePolicy,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            lister,
            target,
            interval,
            policy,
            metrics,
        }
    }

    /// Run one cycle and apply the failure policy
    ///
    /// # Returns
    /// * `Ok(())` - the cycle succeeded, or failed under `FailurePolicy::Retry`
    /// * `Err(PollError)` - the cycle failed under `FailurePolicy::Exit`
    pub async fn tick(&self) -> Result<(), PollError> {
        match poll_once(&self.lister, &self.target).await {
            Ok(_) => {
                self.metrics.record_poll_success();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_poll_error();
                match self.policy {
                    FailurePolicy::Exit => Err(e),
                    FailurePolicy::Retry => {
                        warn!(error = %e, "Pod poll failed (will retry)");
                        Ok(())
                    }
                }
            }
        }
    }

    /// Poll forever, waiting one interval before each cycle
    ///
    /// Only returns when a cycle fails under `FailurePolicy::Exit`.
    pub async fn run(self) -> Result<Infallible, PollError> {
        info!(
            namespace = %self.target.namespace,
            selector = %self.target.label_selector,
            interval_secs = self.interval.as_secs(),
            "Pod status poller running"
        );
        loop {
            tokio::time::sleep(self.interval).await;
            self.tick().await?;
        }
    }
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
