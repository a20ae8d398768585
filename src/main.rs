use anyhow::Context;
use tracing_subscriber::EnvFilter;

use valetdesk::config::AppConfig;
use valetdesk::handlers;
use valetdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let port = config.port;

    let state = AppState::init(config).await?;
    tracing::info!(listeners = ?state.listener_names(), "background listeners running");

    let app = handlers::router(state.clone());

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    state.shutdown();
    Ok(())
}
