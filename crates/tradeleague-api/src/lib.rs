//! TradeLeague REST API
//!
//! HTTP surface over the arena services.
//!
//! # API Structure
//!
//! ```text
//! /api/v1/
//! ├── /me            - Profile, portfolio, ledger, notifications
//! ├── /trades        - Buy and sell
//! ├── /xp            - XP awards
//! ├── /leagues       - Create, join, standings
//! ├── /seasons       - Archives, current season
//! ├── /tiers         - Tier table
//! └── /jobs          - Rating update and season reset (cron secret)
//! ```
//!
//! # Authentication
//!
//! - **Bearer JWT**: HS256 token whose `sub` is the account UUID
//! - **Cron secret**: bearer secret for `/jobs`, compared in constant time

pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::http::HeaderName;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use auth::{AuthConfig, JwtVerifier};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable CORS for browser clients
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    /// Allowed origins for CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Enable response compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,
    /// Enable request tracing
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
    /// Serve Swagger UI and the OpenAPI document
    #[serde(default = "default_true")]
    pub enable_swagger: bool,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: default_cors_origins(),
            enable_compression: true,
            enable_tracing: true,
            enable_swagger: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let mut app = Router::new()
        // API v1 routes
        .nest("/api/v1", routes::api_v1_routes())
        // Health check at root
        .route("/health", axum::routing::get(handlers::health::health_check))
        .route("/ready", axum::routing::get(handlers::health::readiness_check));

    // OpenAPI documentation
    if config.enable_swagger {
        app = app.merge(routes::swagger_routes());
    }

    let mut router = app
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

    // Add compression
    if config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    // Add tracing
    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }));
    }

    // Add request ID middleware; must wrap TraceLayer
    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // Add CORS
    if config.enable_cors {
        let cors = if config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(
                    config
                        .cors_origins
                        .iter()
                        .filter_map(|o| o.parse().ok())
                        .collect::<Vec<_>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
        };
        router = router.layer(cors);
    }

    router
}

/// Create a minimal router for testing
pub fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_v1_routes())
        .route("/health", axum::routing::get(handlers::health::health_check))
        .route("/ready", axum::routing::get(handlers::health::readiness_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.enable_cors);
        assert!(config.enable_compression);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
