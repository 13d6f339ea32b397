//! Application state shared across handlers

use std::sync::Arc;

use tradeleague_arena::Arena;
use tradeleague_db::Database;

use crate::auth::JwtVerifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Arena services over the configured store
    pub arena: Arena,
    /// Token and cron-secret verification
    pub auth: JwtVerifier,
    /// Database pools, absent with the in-memory backend
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(arena: Arena, auth: JwtVerifier, db: Option<Arc<Database>>) -> Self {
        Self { arena, auth, db }
    }
}
