//! TradeLeague Database Layer
//!
//! PostgreSQL persistence for accounts, lots, the ledger, leagues, seasons
//! and job claims, plus an optional Redis quote cache.
//!
//! # Architecture
//!
//! - **PostgreSQL**: every arena record; atomic steps run in one transaction
//! - **Redis**: short-lived quote cache in front of the upstream provider
//!
//! # Repository Pattern
//!
//! Each table group has a repository speaking row types (`Db*`).
//! `PgArenaStore` composes them and implements the arena store traits,
//! translating rows into arena records and database outcomes into arena
//! errors.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repos;
pub mod store;

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use cache::{CacheManager, CachedQuoteProvider};
pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;
pub use store::PgArenaStore;

/// Database connection pools
pub struct Database {
    /// PostgreSQL connection pool
    pub pg: PgPool,
    /// Redis connection pool, when configured
    pub redis: Option<RedisPool>,
}

impl Database {
    /// Connect to PostgreSQL and, if configured, Redis
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");

        let redis = match &config.redis_url {
            Some(url) => {
                info!("Connecting to Redis: {}", config.redis_url_masked().unwrap_or_default());
                let pool = RedisConfig::from_url(url)
                    .create_pool(Some(Runtime::Tokio1))
                    .map_err(|e| DbError::Connection(format!("Redis: {}", e)))?;
                CacheManager::new(pool.clone())
                    .ping()
                    .await
                    .map_err(|e| DbError::Connection(format!("Redis ping: {}", e)))?;
                info!("Connected to Redis");
                Some(pool)
            }
            None => None,
        };

        Ok(Self { pg, redis })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check for both connections
    pub async fn health_check(&self) -> HealthStatus {
        let postgres = sqlx::query("SELECT 1").fetch_one(&self.pg).await.is_ok();

        let redis = match &self.redis {
            Some(pool) => Some(CacheManager::new(pool.clone()).ping().await.is_ok()),
            None => None,
        };

        HealthStatus {
            postgres,
            redis,
            healthy: postgres && redis.unwrap_or(true),
        }
    }

    /// Arena store over the PostgreSQL pool
    pub fn arena_store(&self) -> PgArenaStore {
        PgArenaStore::new(self.pg.clone())
    }
}

/// Health status of database connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub postgres: bool,
    /// `None` when Redis is not configured
    pub redis: Option<bool>,
    pub healthy: bool,
}
