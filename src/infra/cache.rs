//! Redis cache implementation.
//!
//! JSON values with TTLs, pattern invalidation and fixed-window rate-limit
//! counters. A cache built with [`Cache::disabled`] stores nothing and
//! allows every request.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{
    CACHE_PREFIX_PRODUCTS, CACHE_PREFIX_RATE_LIMIT, DEFAULT_CACHE_TTL_SECONDS,
};
use crate::domain::{Product, ProductFilter};
use crate::errors::{AppError, AppResult};

/// Redis cache wrapper; cloning shares the underlying connection.
#[derive(Clone)]
pub struct Cache {
    connection: Option<ConnectionManager>,
    default_ttl: u64,
}

impl Cache {
    /// Connect to Redis at `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            connection: Some(connection),
            default_ttl: DEFAULT_CACHE_TTL_SECONDS,
        })
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            connection: None,
            default_ttl: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.connection.is_some()
    }

    /// Check Redis connectivity. A disabled cache is always healthy.
    pub async fn ping(&self) -> AppResult<()> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(());
        };

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(None);
        };

        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;
        match value {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::internal(format!("Cache deserialization error: {}", e))),
            None => Ok(None),
        }
    }

    /// Set a value in cache with default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with custom TTL (in seconds).
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(());
        };

        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;

        conn.set_ex::<_, _, ()>(key, json, ttl_seconds)
            .await
            .map_err(cache_error)
    }

    /// Delete a value from cache.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(());
        };

        conn.del::<_, ()>(key).await.map_err(cache_error)
    }

    /// Delete all keys matching a pattern, returning how many were removed.
    pub async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(0);
        };

        let keys: Vec<String> = conn.keys(pattern).await.map_err(cache_error)?;
        if keys.is_empty() {
            return Ok(0);
        }

        // UNLINK frees memory off the main thread; fall back to DEL on old servers
        let unlinked: Result<u64, RedisError> =
            redis::cmd("UNLINK").arg(&keys).query_async(&mut conn).await;

        match unlinked {
            Ok(count) => Ok(count),
            Err(e) => {
                tracing::debug!(error = %e, "UNLINK unavailable, using DEL");
                conn.del(&keys).await.map_err(cache_error)
            }
        }
    }

    // =========================================================================
    // Product Listing Cache
    // =========================================================================

    pub fn product_list_key(filter: &ProductFilter) -> String {
        format!("{}{}", CACHE_PREFIX_PRODUCTS, filter.cache_key())
    }

    pub async fn get_products(&self, filter: &ProductFilter) -> AppResult<Option<Vec<Product>>> {
        self.get(&Self::product_list_key(filter)).await
    }

    pub async fn set_products(
        &self,
        filter: &ProductFilter,
        products: &[Product],
        ttl_seconds: u64,
    ) -> AppResult<()> {
        self.set_with_ttl(&Self::product_list_key(filter), &products, ttl_seconds)
            .await
    }

    /// Drop every cached product listing.
    pub async fn invalidate_products(&self) -> AppResult<u64> {
        self.delete_pattern(&format!("{}*", CACHE_PREFIX_PRODUCTS))
            .await
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Count a request against `identifier`'s current window.
    ///
    /// Returns `(count, allowed)`. The window starts with the first request
    /// and lasts `window_seconds`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok((0, true));
        };

        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let count: u64 = conn.incr(&key, 1u64).await.map_err(cache_error)?;
        if count == 1 {
            conn.expire::<_, ()>(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        Ok((count, count <= max_requests))
    }
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_list_keys_share_prefix() {
        let key = Cache::product_list_key(&ProductFilter::by_category("Snacks"));
        assert!(key.starts_with(CACHE_PREFIX_PRODUCTS));
        assert_eq!(Cache::product_list_key(&ProductFilter::default()), "products:all");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_a_no_op() {
        let cache = Cache::disabled();

        assert!(!cache.is_enabled());
        cache.set("key", &42u32).await.unwrap();
        assert_eq!(cache.get::<u32>("key").await.unwrap(), None);
        assert_eq!(cache.invalidate_products().await.unwrap(), 0);
        assert!(cache.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_cache_allows_every_request() {
        let cache = Cache::disabled();

        for _ in 0..50 {
            let (_, allowed) = cache.check_rate_limit("ip:1.2.3.4", 1, 60).await.unwrap();
            assert!(allowed);
        }
    }
}
