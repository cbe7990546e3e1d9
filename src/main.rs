use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use topicsieve::application::ports::RelevanceOracle;
use topicsieve::infrastructure::llm::create_openrouter_client;
use topicsieve::infrastructure::observability::{TracingConfig, init_tracing};
use topicsieve::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment)?;

    init_tracing(&TracingConfig::from_settings(
        &settings.logging,
        environment.as_str(),
    ));

    let oracle = Arc::new(create_openrouter_client(
        &settings.oracle,
        settings.retry.policy().call_timeout,
    )?);
    if let Err(e) = oracle.preflight() {
        tracing::warn!(error = %e, "Oracle not ready; submitted jobs will fail until configured");
    }

    let state = AppState::new(settings.clone(), oracle);
    let _keep_alive = state.broadcaster.spawn_keep_alive(
        settings.progress.keep_alive_interval(),
        settings.progress.subscriber_timeout(),
    );

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!(
        %addr,
        batch_size = settings.batch.size,
        batch_mode = ?settings.batch.mode,
        "Listening"
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
