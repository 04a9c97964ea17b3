// crates/server/src/main.rs
//! Letterscope server binary.

use anyhow::Context;
use clap::Parser;
use letterscope_server::{create_app, AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "warn,letterscope=info,letterscope_server=info,letterscope_server_jobs=info".into()
        }))
        .init();

    let config = ServerConfig::parse();
    let state = AppState::new(&config)
        .with_context(|| format!("preparing upload dir {}", config.upload_dir.display()))?;
    let app = create_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        upload_dir = %config.upload_dir.display(),
        extract_timeout_secs = config.extract_timeout_secs,
        max_concurrent_jobs = config.max_concurrent_jobs(),
        "Letterscope listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
