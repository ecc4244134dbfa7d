use std::net::SocketAddr;
use std::sync::Arc;

use adlink_api::{app, AppState};
use adlink_channel::VerificationPolicy;
use adlink_store::{app_config::Config, DbClient};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adlink_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting AdLink API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    db.migrate().await.context("failed to run migrations")?;

    let policy = VerificationPolicy { code_length: config.verification.code_length };
    let state = AppState::new(Arc::new(db.market_store()), policy);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
