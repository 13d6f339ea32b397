//! Custom Axum Extractors
//!
//! Request extractors for authentication, idempotency keys and validation.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tradeleague_types::AccountId;

use crate::auth::bearer_token;
use crate::error::{format_validation_errors, ApiError};
use crate::state::AppState;

/// Header carrying a caller-chosen job key
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Longest accepted idempotency key
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

pub fn error_response(error: ApiError) -> Response {
    error.into_response()
}

fn authorization(parts: &Parts) -> Result<&str, Response> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| error_response(ApiError::Unauthorized))?;
    bearer_token(header).ok_or_else(|| error_response(ApiError::Unauthorized))
}

// =============================================================================
// Authenticated User Extractor
// =============================================================================

/// Account resolved from a verified bearer JWT
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: AccountId,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = authorization(parts)?;
        let identity = state.auth.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            error_response(e)
        })?;

        Ok(AuthenticatedUser {
            account_id: identity.account_id,
            username: identity.username,
        })
    }
}

// =============================================================================
// Cron Auth Extractor
// =============================================================================

/// Caller holding the cron secret
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CronAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = authorization(parts)?;
        if !state.auth.verify_cron_secret(token) {
            tracing::warn!("Job request with invalid cron secret");
            return Err(error_response(ApiError::InvalidJobCredentials));
        }
        Ok(CronAuth)
    }
}

// =============================================================================
// Idempotency Key Extractor
// =============================================================================

/// Optional `Idempotency-Key` header
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(IdempotencyKey(None));
        };
        let key = value
            .to_str()
            .map(str::trim)
            .map_err(|_| error_response(ApiError::BadRequest("Idempotency-Key must be ASCII".into())))?;

        if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(error_response(ApiError::BadRequest(format!(
                "Idempotency-Key must be 1 to {} characters",
                MAX_IDEMPOTENCY_KEY_LEN
            ))));
        }

        Ok(IdempotencyKey(Some(key.to_string())))
    }
}

// =============================================================================
// Validated Query Extractor
// =============================================================================

/// Query extractor with validation
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| error_response(ApiError::BadRequest(e.to_string())))?;

        value
            .validate()
            .map_err(|e| error_response(ApiError::ValidationError(format_validation_errors(&e))))?;

        Ok(ValidatedQuery(value))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// JSON extractor with validation
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = Response;

    async fn from_request(req: axum::http::Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| error_response(ApiError::BadRequest(e.to_string())))?;

        value
            .validate()
            .map_err(|e| error_response(ApiError::ValidationError(format_validation_errors(&e))))?;

        Ok(ValidatedJson(value))
    }
}
