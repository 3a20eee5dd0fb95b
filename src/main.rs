use std::sync::Arc;

use anyhow::Context;
use flowforge_api::config::AppConfig;
use flowforge_api::containers::build_driver;
use flowforge_api::database::{DatabaseManager, PgStore};
use flowforge_api::{router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flowforge_api=info,tower_http=info")),
        )
        .init();

    let config: AppConfig = flowforge_api::config::config().clone();
    tracing::info!("Starting FlowForge API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }
    if flowforge_api::is_development!() {
        tracing::warn!("Development mode: stub containers and the built-in JWT secret unless overridden");
    }

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    database.health_check().await.context("database health check failed")?;
    let store = Arc::new(PgStore::new(database.pool().clone()));
    let containers = build_driver(&config)?;
    tracing::info!("Using {} container driver", containers.name());

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let app = router(AppState::new(store, containers, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("FlowForge API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    database.close().await;
    Ok(())
}
