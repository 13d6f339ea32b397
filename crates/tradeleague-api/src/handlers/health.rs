//! Health Check Handlers
//!
//! Endpoints for service health monitoring.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

/// Readiness check response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`
    pub status: String,
    /// `postgres` or `memory`
    pub backend: String,
    pub components: Vec<ComponentStatus>,
}

/// Component status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentStatus {
    pub name: String,
    /// `healthy` or `unhealthy`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentStatus {
    fn new(name: &str, healthy: bool, error: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            error,
        }
    }
}

/// Health check endpoint
///
/// Returns 200 if the service is running. Dependencies are not checked.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// Readiness check endpoint
///
/// Returns 200 once the store answers and, with the Postgres backend, both
/// connection pools respond.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let mut components = Vec::new();

    let backend = match &state.db {
        Some(db) => {
            let health = db.health_check().await;
            components.push(ComponentStatus::new("postgres", health.postgres, None));
            if let Some(redis) = health.redis {
                components.push(ComponentStatus::new("redis", redis, None));
            }
            "postgres"
        }
        None => "memory",
    };

    let store = match state.arena.seasons.current().await {
        Ok(_) => ComponentStatus::new("arena_store", true, None),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check could not read the current season");
            ComponentStatus::new("arena_store", false, Some(e.to_string()))
        }
    };
    components.push(store);

    let ready = components.iter().all(|c| c.status == "healthy");
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            backend: backend.to_string(),
            components,
        }),
    )
}
