//! API error handling
//!
//! Every failure leaves the API as `{ "code": <i32>, "msg": <string> }` with
//! an HTTP status derived from the error group.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradeleague_arena::ArenaError;
use tradeleague_types::TypesError;
use utoipa::ToSchema;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with stable numeric codes
#[derive(Debug, Error)]
pub enum ApiError {
    // =========================================================================
    // Authentication Errors (-1000 to -1099)
    // =========================================================================
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid job credentials")]
    InvalidJobCredentials,

    // =========================================================================
    // Request Errors (-1100 to -1199)
    // =========================================================================
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    // =========================================================================
    // Trading Errors (-2000 to -2099)
    // =========================================================================
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Invalid lot: {0}")]
    InvalidLot(String),

    #[error("Lot locked: {0}")]
    LotLocked(String),

    // =========================================================================
    // League Errors (-3000 to -3099)
    // =========================================================================
    #[error("League is full (max {max} members)")]
    LeagueFull { max: u32 },

    #[error("League has ended")]
    LeagueEnded,

    #[error("Already a member of this league")]
    AlreadyMember,

    #[error("Invite code already in use")]
    InviteCodeTaken,

    // =========================================================================
    // Job Errors (-4000 to -4099)
    // =========================================================================
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Rotation in progress: {0}")]
    RotationInProgress(String),

    // =========================================================================
    // Resource Errors
    // =========================================================================
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Dependency & Internal Errors (-5000 to -5099)
    // =========================================================================
    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Stable numeric error code
    pub fn error_code(&self) -> i32 {
        match self {
            // Authentication (-1000 to -1099)
            Self::Unauthorized => -1010,
            Self::InvalidToken => -1011,
            Self::TokenExpired => -1012,
            Self::InvalidJobCredentials => -1020,

            // Request (-1100 to -1199)
            Self::BadRequest(_) => -1100,
            Self::ValidationError(_) => -1102,
            Self::InvalidSymbol(_) => -1121,

            // Trading (-2000 to -2099)
            Self::InsufficientFunds { .. } => -2010,
            Self::InvalidLot(_) => -2011,
            Self::LotLocked(_) => -2012,

            // League (-3000 to -3099)
            Self::LeagueFull { .. } => -3001,
            Self::LeagueEnded => -3002,
            Self::AlreadyMember => -3003,
            Self::InviteCodeTaken => -3004,

            // Jobs (-4000 to -4099)
            Self::AlreadyProcessed(_) => -4001,
            Self::RotationInProgress(_) => -4002,

            // Resource
            Self::NotFound(_) => -4040,
            Self::Conflict(_) => -4090,
            Self::Forbidden(_) => -4030,

            // Dependency & Internal (-5000 to -5099)
            Self::Internal => -5000,
            Self::ServiceUnavailable => -5001,
            Self::Upstream(_) => -5002,
        }
    }

    /// HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Self::BadRequest(_) | Self::ValidationError(_) | Self::InvalidSymbol(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired | Self::InvalidJobCredentials => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::Conflict(_)
            | Self::AlreadyMember
            | Self::InviteCodeTaken
            | Self::AlreadyProcessed(_)
            | Self::RotationInProgress(_) => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            Self::InsufficientFunds { .. }
            | Self::InvalidLot(_)
            | Self::LotLocked(_)
            | Self::LeagueFull { .. }
            | Self::LeagueEnded => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Bad Gateway
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub msg: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.error_code(),
            msg: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ArenaError> for ApiError {
    fn from(err: ArenaError) -> Self {
        let msg = err.to_string();
        match err {
            ArenaError::AccountNotFound(_) | ArenaError::LeagueNotFound(_) => Self::NotFound(msg),
            ArenaError::Validation(m) => Self::ValidationError(m),
            ArenaError::InvalidLot(m) => Self::InvalidLot(m),
            ArenaError::LockNotExpired { .. } => Self::LotLocked(msg),
            ArenaError::InsufficientFunds { required, available } => Self::InsufficientFunds { required, available },
            ArenaError::LeagueFull { max } => Self::LeagueFull { max },
            ArenaError::LeagueEnded => Self::LeagueEnded,
            ArenaError::AlreadyMember => Self::AlreadyMember,
            ArenaError::InviteCodeTaken => Self::InviteCodeTaken,
            ArenaError::Forbidden(m) => Self::Forbidden(m),
            ArenaError::ConcurrentModification | ArenaError::InvalidStateTransition { .. } => Self::Conflict(msg),
            ArenaError::AlreadyProcessed { .. } | ArenaError::AlreadyRotated { .. } => Self::AlreadyProcessed(msg),
            ArenaError::RotationInProgress { key } => Self::RotationInProgress(key),
            ArenaError::Upstream(m) => {
                tracing::warn!(error = %m, "Upstream dependency failed");
                Self::Upstream(m)
            }
            ArenaError::Storage(m) => {
                tracing::error!(error = %m, "Storage error");
                Self::Internal
            }
        }
    }
}

impl From<TypesError> for ApiError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::InvalidSymbol(s) => Self::InvalidSymbol(s),
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(format_validation_errors(&err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

/// Flatten validator errors into `field: message` pairs
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeleague_types::{AccountId, LotId};

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unauthorized.error_code(), -1010);
        assert_eq!(ApiError::LeagueFull { max: 3 }.error_code(), -3001);
        assert_eq!(ApiError::Internal.error_code(), -5000);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ValidationError("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AlreadyMember.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::LeagueEnded.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::Upstream("x".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_arena_errors_map_by_group() {
        let cases = [
            (ArenaError::AccountNotFound(AccountId::new()), StatusCode::NOT_FOUND),
            (ArenaError::Validation("qty".into()), StatusCode::BAD_REQUEST),
            (ArenaError::Forbidden("not yours".into()), StatusCode::FORBIDDEN),
            (ArenaError::ConcurrentModification, StatusCode::CONFLICT),
            (
                ArenaError::AlreadyProcessed {
                    job: "rating_update".into(),
                    period: "2026-W42".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                ArenaError::LockNotExpired {
                    lot_id: LotId::new(),
                    until: chrono::Utc::now(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ArenaError::Upstream("quote".into()), StatusCode::BAD_GATEWAY),
            (ArenaError::Storage("pool closed".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (arena, status) in cases {
            assert_eq!(ApiError::from(arena).status_code(), status);
        }
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = ApiError::from(ArenaError::Storage("password authentication failed".into()));
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, -5000);
        assert_eq!(body.msg, "Internal server error");
    }
}
