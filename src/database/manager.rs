use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("schema.sql");

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the Postgres pool for the control-plane database
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Connect using `config.url` and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(connect_options(&url, config.enable_query_logging)?)
            .await?;

        info!(
            "Connected to database {} (max {} connections)",
            url.path().trim_start_matches('/'),
            config.max_connections
        );

        let manager = Self { pool };
        manager.initialize_schema().await?;
        Ok(manager)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create any missing tables. Every statement is idempotent.
    pub async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        for statement in schema_statements(SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

fn schema_statements(schema: &str) -> impl Iterator<Item = &str> {
    schema.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// sqlx logs every statement by default; turn that off unless asked for
fn connect_options(url: &url::Url, log_queries: bool) -> Result<PgConnectOptions, DatabaseError> {
    let options: PgConnectOptions = url.as_str().parse()?;
    Ok(if log_queries {
        options
    } else {
        options.disable_statement_logging()
    })
}
