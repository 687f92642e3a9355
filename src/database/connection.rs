//! PostgreSQL connection
//!
//! Opens the pool and applies the embedded migrations.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Owns the connection pool
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Connects using `config` and brings the schema up to date
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.masked_url(), "connecting to database");

        let pool = config
            .create_pool()
            .await
            .context("failed to open the connection pool")?;

        let connection = Self { pool };
        connection.run_migrations().await?;
        Ok(connection)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
