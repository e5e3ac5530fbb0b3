use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tuteasy_booking::{create_router, initialize_backend, BookingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BookingConfig::load().context("Failed to load configuration")?;
    let addr = config.bind_address()?;

    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config.server)?;

    info!("Starting booking API server at {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
