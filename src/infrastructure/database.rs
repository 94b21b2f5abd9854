use crate::config::DatabaseSettings;
use crate::infrastructure::log_messages;
use crate::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool sized from the database settings.
    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<Self> {
        info!(
            host = %settings.host,
            database = %settings.database_name,
            "{}",
            log_messages::database::CONNECTING
        );
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(url)
            .await?;
        info!("{}", log_messages::database::CONNECTION_ESTABLISHED);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("{}", log_messages::database::MIGRATION_STARTED);
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("{}", log_messages::database::MIGRATION_COMPLETED);
        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pool)
            .await?;

        let health_check: i32 = row.try_get("health_check")?;

        if health_check == 1 {
            Ok(())
        } else {
            Err(Error::Internal)
        }
    }
}
