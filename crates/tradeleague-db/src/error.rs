//! Database error types

use thiserror::Error;
use tradeleague_arena::ArenaError;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Row version changed concurrently")]
    VersionConflict,

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    /// Name of the violated unique constraint, if this error is one
    pub fn unique_violation(&self) -> Option<&str> {
        match self {
            DbError::Query(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Some(db.constraint().unwrap_or_default())
            }
            _ => None,
        }
    }
}

impl From<deadpool_redis::PoolError> for DbError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        DbError::Redis(e.to_string())
    }
}

impl From<redis::RedisError> for DbError {
    fn from(e: redis::RedisError) -> Self {
        DbError::Redis(e.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}

impl From<DbError> for ArenaError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::VersionConflict => ArenaError::ConcurrentModification,
            other => ArenaError::Storage(other.to_string()),
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_maps_to_concurrent_modification() {
        assert!(matches!(ArenaError::from(DbError::VersionConflict), ArenaError::ConcurrentModification));
    }

    #[test]
    fn test_other_errors_become_storage() {
        let err = ArenaError::from(DbError::NotFound("season row".into()));
        assert!(matches!(err, ArenaError::Storage(msg) if msg.contains("season row")));
        assert!(DbError::Redis("down".into()).unique_violation().is_none());
    }
}
