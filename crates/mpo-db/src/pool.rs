//! Database connection pool management.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use mpo_core::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Postgres connection pool, instrumented with the same metric names the
/// rest of the process uses for pool-level observability.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    #[instrument(level = "debug", skip(config))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        debug!("🔧 creating database connection pool");
        let start = Instant::now();

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.url)
            .await?;

        histogram!("db.pool.create.time", start.elapsed());
        info!(
            "✅ database connection pool ready, max_connections={}",
            config.max_connections
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn is_healthy(&self) -> bool {
        check_pool_health(&self.pool).await.unwrap_or(false)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        let start = Instant::now();
        counter!("db.pool.connections.checked_out", 1);

        let conn = self.pool.acquire().await?;

        histogram!("db.pool.acquire.time", start.elapsed());
        Ok(conn)
    }
}

#[instrument(level = "debug", skip(pool))]
pub async fn check_pool_health(pool: &PgPool) -> Result<bool> {
    let row = sqlx::query("SELECT 1").fetch_one(pool).await?;
    let _: i32 = row.try_get(0)?;
    Ok(true)
}

#[instrument(level = "debug", skip(pool))]
pub async fn active_connections(pool: &PgPool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM pg_stat_activity WHERE datname = current_database()")
            .fetch_one(pool)
            .await?;
    Ok(count)
}
