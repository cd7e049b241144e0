//! End-to-end tests: config file on disk through to HTTP responses

use async_trait::async_trait;
use hello_app::app::run_cluster_aware;
use hello_app::poller::PodLister;
use hello_app::server::{bind, serve, AppState};
use hello_app::{load_configuration, Settings};
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use kube::api::ObjectMeta;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn write_temp_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hello-app-it-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).expect("should write temp config");
    path
}

/// Serve the greeting for the config file at `path`, returning the bound port
async fn serve_config(path: &Path) -> (u16, tokio::task::JoinHandle<()>) {
    let config = load_configuration(path).expect("should load config");
    let listener = bind(0).await.expect("should bind ephemeral port");
    let port = listener.local_addr().expect("bound address").port();
    let handle = tokio::spawn(async move {
        serve(listener, AppState::new(config)).await.expect("server should run");
    });
    (port, handle)
}

struct TwoPods;

#[async_trait]
impl PodLister for TwoPods {
    async fn list_pods(&self, _namespace: &str, _label_selector: &str) -> kube::Result<Vec<Pod>> {
        let pod = |name: &str, phase: &str| Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
        };
        Ok(vec![pod("a", "Running"), pod("b", "Pending")])
    }
}

#[tokio::test]
async fn test_version_from_config_file_is_served() {
    let path = write_temp_config(r#"{"version": "1.2.3"}"#);
    let (port, handle) = serve_config(&path).await;

    let response = reqwest::get(format!("http://127.0.0.1:{}/", port))
        .await
        .expect("Failed to connect to server");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.expect("should have body"),
        "hello-app says hi! [version: 1.2.3]\n"
    );

    handle.abort();
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_missing_version_serves_empty_substitution() {
    let path = write_temp_config("{}");
    let (port, handle) = serve_config(&path).await;

    let body = reqwest::get(format!("http://127.0.0.1:{}/", port))
        .await
        .expect("Failed to connect to server")
        .text()
        .await
        .expect("should have body");

    assert_eq!(body, "hello-app says hi! [version: ]\n");

    handle.abort();
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_pod_status_gauge_stays_zero_after_polling() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("should find a free port")
        .port();
    let settings = Settings {
        port,
        poll_interval: Duration::from_millis(20),
        ..Settings::default()
    };
    let path = write_temp_config(r#"{"version": "x"}"#);
    let config = load_configuration(&path).expect("should load config");

    let handle =
        tokio::spawn(async move { run_cluster_aware(&settings, config, TwoPods).await });

    let client = reqwest::Client::new();
    let mut scrape = None;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Ok(response) = client
            .get(format!("http://127.0.0.1:{}/metrics", port))
            .send()
            .await
        {
            scrape = Some(response.text().await.expect("should have body"));
            break;
        }
    }
    let scrape = scrape.expect("metrics endpoint should come up");

    assert!(scrape.contains("# TYPE hello_app_pod_status gauge"));
    assert!(scrape.contains("hello_app_pod_status 0"), "metrics: {scrape}");

    handle.abort();
    std::fs::remove_file(path).ok();
}
