//! Arena error taxonomy
//!
//! Variants fall into validation, domain-rule, authorization, conflict,
//! upstream-dependency and storage failures. The API layer maps each group
//! onto an HTTP status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tradeleague_marketdata::MarketDataError;
use tradeleague_types::{AccountId, LotId, TypesError};

/// Result type for arena operations
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Arena errors
#[derive(Debug, Error)]
pub enum ArenaError {
    // ========================================================================
    // Lookups
    // ========================================================================

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("League not found: {0}")]
    LeagueNotFound(String),

    // ========================================================================
    // Validation & domain rules
    // ========================================================================

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid lot: {0}")]
    InvalidLot(String),

    #[error("Lot {lot_id} is locked until {until}")]
    LockNotExpired { lot_id: LotId, until: DateTime<Utc> },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("League is full (max {max} members)")]
    LeagueFull { max: u32 },

    #[error("League has ended")]
    LeagueEnded,

    #[error("Already a member of this league")]
    AlreadyMember,

    #[error("Invite code already in use")]
    InviteCodeTaken,

    // ========================================================================
    // Authorization
    // ========================================================================

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ========================================================================
    // Conflicts & idempotency
    // ========================================================================

    #[error("Account was modified concurrently, retry the request")]
    ConcurrentModification,

    #[error("Job {job} already processed for period {period}")]
    AlreadyProcessed { job: String, period: String },

    #[error("Season rotation {key} already completed")]
    AlreadyRotated { key: String },

    #[error("Season rotation {key} is in progress")]
    RotationInProgress { key: String },

    #[error("Invalid season state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // ========================================================================
    // Dependencies
    // ========================================================================

    #[error("Upstream dependency failed: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<MarketDataError> for ArenaError {
    fn from(err: MarketDataError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<TypesError> for ArenaError {
    fn from(err: TypesError) -> Self {
        Self::Validation(err.to_string())
    }
}
