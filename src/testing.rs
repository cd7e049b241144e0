//! Shared test doubles

use crate::poller::PodLister;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use kube::api::ObjectMeta;
use std::sync::Mutex;

/// Lister returning a fixed set of pods and recording each query
pub struct StaticLister {
    pods: Vec<Pod>,
    pub queries: Mutex<Vec<(String, String)>>,
}

impl StaticLister {
    pub fn new(pods: Vec<Pod>) -> Self {
        Self {
            pods,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PodLister for StaticLister {
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> kube::Result<Vec<Pod>> {
        self.queries
            .lock()
            .unwrap()
            .push((namespace.to_string(), label_selector.to_string()));
        Ok(self.pods.clone())
    }
}

/// Lister whose every call fails like an API server error
pub struct FailingLister;

#[async_trait]
impl PodLister for FailingLister {
    async fn list_pods(&self, _namespace: &str, _label_selector: &str) -> kube::Result<Vec<Pod>> {
        Err(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "etcdserver: request timed out".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        }))
    }
}

/// Pod in the hello-app namespace with an optional phase
pub fn make_pod(name: &str, phase: Option<&str>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("hello-app".to_string()),
            ..Default::default()
        },
        spec: None,
        status: phase.map(|p| PodStatus {
            phase: Some(p.to_string()),
            ..Default::default()
        }),
    }
}
