// Fixed-window rate limit counters shared through Redis

use crate::errors::{AppError, Result};
use crate::rate_limit::{Admission, RateLimitStore};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, Script};
use std::time::Duration;

const RATE_LIMIT_PREFIX: &str = "ratelimit:";

// Deny without touching the counter; otherwise INCR and start the window
// on the first hit. Returns {allowed, count, ttl_ms}.
static FIXED_WINDOW_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local key = KEYS[1]
        local limit = tonumber(ARGV[1])
        local window_ms = tonumber(ARGV[2])

        local current = tonumber(redis.call('GET', key) or '0')
        if current >= limit then
            local ttl = redis.call('PTTL', key)
            if ttl == -1 then
                redis.call('PEXPIRE', key, window_ms)
                ttl = window_ms
            end
            if ttl < 0 then
                ttl = 0
            end
            return {0, current, ttl}
        end

        local count = redis.call('INCR', key)
        if count == 1 then
            redis.call('PEXPIRE', key, window_ms)
        end
        return {1, count, 0}
        "#,
    )
});

/// Rate limit store backed by Redis, for deployments running several
/// workers. Key expiry replaces the in-memory sweep.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    namespace: String,
}

impl RedisStore {
    /// `namespace` keeps the counters of different limiters apart
    pub fn new(manager: ConnectionManager, namespace: &str) -> Self {
        Self {
            manager,
            namespace: format!("{}{}:", RATE_LIMIT_PREFIX, namespace),
        }
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Reset rate limit counter for a key
    pub async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("DEL")
            .arg(self.redis_key(key))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> Result<Admission> {
        let mut conn = self.manager.clone();
        let window_ms = window.as_millis().max(1) as u64;

        let result: Vec<i64> = FIXED_WINDOW_SCRIPT
            .key(self.redis_key(key))
            .arg(limit)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        let (allowed, count, ttl_ms) = match result.as_slice() {
            [allowed, count, ttl_ms] => (*allowed == 1, *count, *ttl_ms),
            _ => {
                return Err(AppError::Internal(
                    "Unexpected rate limit script reply".to_string(),
                ))
            }
        };

        if allowed {
            Ok(Admission::Allowed {
                count: count.max(0) as u32,
                limit,
            })
        } else {
            Ok(Admission::Denied {
                retry_after: Duration::from_millis(ttl_ms.max(0) as u64).as_secs(),
            })
        }
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", self.namespace);

        let mut cursor: u64 = 0;
        let mut total = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            total += keys.len();
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(total)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance at REDIS_URL
    async fn store(namespace: &str) -> RedisStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let manager = crate::redis::create_client(&url).await.unwrap();
        RedisStore::new(manager, namespace)
    }

    #[tokio::test]
    #[ignore]
    async fn test_fixed_window_limit() {
        let store = store("test-limit").await;
        store.reset("k").await.unwrap();

        let window = Duration::from_secs(60);
        assert_eq!(
            store.hit("k", 2, window).await.unwrap(),
            Admission::Allowed { count: 1, limit: 2 }
        );
        assert_eq!(
            store.hit("k", 2, window).await.unwrap(),
            Admission::Allowed { count: 2, limit: 2 }
        );
        match store.hit("k", 2, window).await.unwrap() {
            Admission::Denied { retry_after } => assert!(retry_after <= 60),
            other => panic!("expected denial, got {:?}", other),
        }

        store.reset("k").await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_window_expiry_resets_counter() {
        let store = store("test-expiry").await;
        store.reset("k").await.unwrap();

        let window = Duration::from_millis(200);
        assert!(store.hit("k", 1, window).await.unwrap().is_allowed());
        assert!(!store.hit("k", 1, window).await.unwrap().is_allowed());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.hit("k", 1, window).await.unwrap().is_allowed());

        store.reset("k").await.unwrap();
    }
}
