use hello_app::Settings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting hello-app server");

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Invalid settings");
            return Err(e.into());
        }
    };

    info!(
        port = settings.port,
        cluster_aware = settings.cluster_aware,
        config = %settings.config_path.display(),
        "Settings loaded"
    );

    // Every failure is fatal: log it and exit non-zero
    if let Err(e) = hello_app::run(settings).await {
        error!(error = %e, "hello-app terminated");
        return Err(e.into());
    }

    Ok(())
}
