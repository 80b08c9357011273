//! Demo HTTP server.

use form_action_runtime::metrics::MetricsServer;
use signup_demo::{build_router, store::Subscribers, AppState, Config};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(host = %config.host, port = config.port, "Configuration loaded");

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;

    let mut state = AppState::new(Subscribers::new());
    let mut metrics = MetricsServer::new(addr);
    match metrics.start() {
        Ok(()) => state = state.with_metrics(metrics),
        Err(e) => warn!(error = %e, "metrics disabled"),
    }

    info!(%addr, "Starting form action demo server");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
