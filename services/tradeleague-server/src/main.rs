//! TradeLeague Server
//!
//! Serves the TradeLeague REST API over either the PostgreSQL store or the
//! in-memory store.
//!
//! # Usage
//!
//! ```bash
//! # In-memory backend, relaxed secrets
//! tradeleague-server --dev-mode
//!
//! # PostgreSQL backend with a Redis quote cache
//! tradeleague-server --backend postgres --database-url postgres://... --redis-url redis://...
//!
//! # Environment overrides
//! TRADELEAGUE__SERVER__PORT=9000 tradeleague-server
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradeleague_api::{create_router, AppState, JwtVerifier};
use tradeleague_arena::{Arena, ArenaStore, InMemoryArenaStore};
use tradeleague_db::{CachedQuoteProvider, Database};
use tradeleague_marketdata::{QuoteProvider, YahooQuoteProvider};

use crate::config::{LoggingConfig, MetricsConfig, RedisSettings, ServerConfig, StorageBackend};

// =============================================================================
// CLI Arguments
// =============================================================================

/// TradeLeague API server
#[derive(Parser, Debug)]
#[command(name = "tradeleague-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "TRADELEAGUE_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "TRADELEAGUE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TRADELEAGUE_PORT")]
    port: Option<u16>,

    /// Storage backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Log level or filter directive
    #[arg(long, env = "TRADELEAGUE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "TRADELEAGUE_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection URL for the quote cache
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// HS256 secret for user tokens
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Bearer secret for the job endpoints
    #[arg(long, env = "CRON_SECRET")]
    cron_secret: Option<String>,

    /// Allow default secrets
    #[arg(long, env = "TRADELEAGUE_DEV_MODE")]
    dev_mode: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    Postgres,
    Memory,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Postgres => StorageBackend::Postgres,
            BackendArg::Memory => StorageBackend::Memory,
        }
    }
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.backend {
            config.server.backend = backend.into();
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(url) = self.database_url {
            config.database.postgres_url = url;
        }
        if let Some(url) = self.redis_url {
            config.redis = Some(RedisSettings { url });
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt_secret = secret;
        }
        if let Some(secret) = self.cron_secret {
            config.auth.cron_secret = secret;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let dev_mode = args.dev_mode;

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?server_config.server.backend,
        "Starting TradeLeague server"
    );

    server_config.validate(dev_mode)?;

    if server_config.metrics.enabled {
        init_metrics(&server_config.metrics)?;
    }

    let upstream: Arc<dyn QuoteProvider> = Arc::new(YahooQuoteProvider::new(Duration::from_secs(
        server_config.market.quote_timeout_secs,
    ))?);

    let (store, quotes, db) = match server_config.server.backend {
        StorageBackend::Postgres => {
            let db = init_database(&server_config).await?;
            let quotes: Arc<dyn QuoteProvider> = match &db.redis {
                Some(pool) => Arc::new(CachedQuoteProvider::new(
                    upstream,
                    pool.clone(),
                    Duration::from_secs(server_config.market.quote_cache_ttl_secs),
                )),
                None => upstream,
            };
            let store: Arc<dyn ArenaStore> = Arc::new(db.arena_store());
            (store, quotes, Some(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; state is lost on restart");
            let store: Arc<dyn ArenaStore> = Arc::new(InMemoryArenaStore::new());
            (store, upstream, None)
        }
    };

    let fx = Arc::new(server_config.arena.static_fx_rates());
    let arena = Arena::new(store, quotes, fx, server_config.arena.clone());
    let auth = JwtVerifier::new(server_config.auth.clone());
    let state = Arc::new(AppState::new(arena, auth, db));

    let app = create_router(state, server_config.api.clone());

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }
}

fn init_metrics(config: &MetricsConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(port = config.port, "Prometheus exporter listening");
    Ok(())
}

async fn init_database(config: &ServerConfig) -> anyhow::Result<Arc<Database>> {
    let db = Database::connect(&config.db_config()).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    let health = db.health_check().await;
    if !health.healthy {
        anyhow::bail!("Database health check failed");
    }
    tracing::info!(postgres = health.postgres, redis = ?health.redis, "Database health check passed");

    Ok(Arc::new(db))
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for Ctrl+C or SIGTERM, then give in-flight requests `grace`
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }

    tracing::info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
    tokio::time::sleep(grace).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["tradeleague-server", "--port", "9000", "--backend", "postgres"]);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.backend, Some(BackendArg::Postgres));
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "tradeleague-server",
            "--redis-url",
            "redis://localhost:6379",
            "--cron-secret",
            "s3cret",
        ]);
        let mut config = ServerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.auth.cron_secret, "s3cret");
        assert!(config.redis.is_some());
    }
}
