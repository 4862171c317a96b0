#![forbid(unsafe_code)]

use std::sync::Arc;

use crimewatch_adapter::{router, AppRuntime};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "crimewatch=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = Arc::new(AppRuntime::default_from_env()?);
    let config = runtime.config().clone();
    let app = router(runtime);

    info!(
        addr = %config.bind,
        store_path = %config.store_path.display(),
        upload_dir = %config.upload_dir.display(),
        model_path = %config.model_path.display(),
        max_upload_bytes = config.max_upload_bytes,
        "crimewatch_http listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; shutting down");
    }
    info!("crimewatch_http shutting down");
}
