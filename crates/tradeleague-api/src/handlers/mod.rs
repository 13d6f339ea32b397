//! API Handlers
//!
//! Request handlers for all API endpoints.
//! Each module handles a specific domain.

pub mod account;
pub mod health;
pub mod jobs;
pub mod league;
pub mod season;
pub mod trade;
pub mod xp;

pub use health::*;
