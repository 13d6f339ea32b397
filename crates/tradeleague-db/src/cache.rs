//! Redis cache for quotes
//!
//! Quote lookups run once per held symbol on every valuation, so a short
//! TTL cache in front of the upstream provider keeps a portfolio page or a
//! rating run from hammering it. Redis trouble never fails a lookup; the
//! cache is bypassed and the upstream answer is returned.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool as RedisPool};
use serde::{de::DeserializeOwned, Serialize};
use tradeleague_marketdata::{MarketDataResult, Quote, QuoteProvider};
use tradeleague_types::Symbol;

use crate::{DbError, DbResult};

/// Cache key prefixes
pub mod keys {
    pub const QUOTE: &str = "quote:";
}

/// Default TTLs
pub mod ttl {
    use std::time::Duration;

    pub const QUOTE: Duration = Duration::from_secs(15);
}

pub fn quote_key(symbol: &Symbol) -> String {
    format!("{}{}", keys::QUOTE, symbol)
}

pub struct CacheManager {
    pool: RedisPool,
}

impl CacheManager {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Set a value with expiration
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let json = serde_json::to_string(value)?;
        conn.set_ex::<_, _, ()>(key, json, ttl.as_secs()).await?;
        Ok(())
    }

    /// Get a value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let mut conn = self.pool.get().await?;
        let result: Option<String> = conn.get(key).await?;
        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let mut conn = self.pool.get().await?;
        let deleted: i32 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    pub async fn ping(&self) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let pong: String = deadpool_redis::redis::cmd("PING").query_async(&mut *conn).await?;
        if pong != "PONG" {
            return Err(DbError::Redis(format!("unexpected PING reply {}", pong)));
        }
        Ok(())
    }
}

/// Quote provider that serves recent quotes from Redis
pub struct CachedQuoteProvider {
    inner: Arc<dyn QuoteProvider>,
    cache: CacheManager,
    ttl: Duration,
}

impl CachedQuoteProvider {
    pub fn new(inner: Arc<dyn QuoteProvider>, pool: RedisPool, ttl: Duration) -> Self {
        Self {
            inner,
            cache: CacheManager::new(pool),
            ttl,
        }
    }
}

#[async_trait]
impl QuoteProvider for CachedQuoteProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn latest_quote(&self, symbol: &Symbol) -> MarketDataResult<Quote> {
        let key = quote_key(symbol);
        match self.cache.get::<Quote>(&key).await {
            Ok(Some(quote)) => return Ok(quote),
            Ok(None) => {}
            Err(e) => tracing::warn!(%symbol, error = %e, "Quote cache read failed"),
        }

        let quote = self.inner.latest_quote(symbol).await?;
        if let Err(e) = self.cache.set(&key, &quote, self.ttl).await {
            tracing::warn!(%symbol, error = %e, "Quote cache write failed");
        }
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_key_uses_normalized_symbol() {
        let symbol = Symbol::new(" shop.to ").unwrap();
        assert_eq!(quote_key(&symbol), "quote:SHOP.TO");
    }
}
