use crate::errors::{AppError, Result};
use crate::observability::MetricsRecorder;
use crate::rate_limit::config::RateLimitConfig;
use crate::rate_limit::key::RequestContext;
use crate::rate_limit::store::{Admission, MemoryStore, RateLimitStore};
use std::fmt;
use std::sync::Arc;

/// Fixed-window admission checker owning its own store
pub struct RateLimiter {
    name: String,
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    /// Create a limiter backed by a fresh in-memory store
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Result<Self> {
        Self::with_store(name, config, Arc::new(MemoryStore::new()))
    }

    /// Create a limiter on an explicit store. The store must not be shared
    /// with another limiter.
    pub fn with_store(
        name: impl Into<String>,
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
    ) -> Result<Self> {
        config.validate()?;

        let name = name.into();
        tracing::info!(
            limiter = %name,
            backend = store.backend(),
            requests_limit = config.requests_limit,
            auth_requests_limit = ?config.auth_requests_limit,
            window_seconds = config.window_size.as_secs(),
            scope = ?config.scope,
            "Rate limiter configured"
        );

        Ok(Self {
            name,
            config,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check a key directly
    pub async fn check(&self, key: &str, is_authenticated: bool) -> Result<Admission> {
        let limit = self.config.limit_for(is_authenticated);
        let admission = self.store.hit(key, limit, self.config.window_size).await?;

        match admission {
            Admission::Allowed { count, limit } => {
                tracing::debug!(
                    limiter = %self.name,
                    key = %key,
                    count,
                    limit,
                    "Request admitted"
                );
                MetricsRecorder::record_rate_limit_decision(&self.name, "allowed");
            }
            Admission::Denied { retry_after } => {
                tracing::warn!(
                    limiter = %self.name,
                    key = %key,
                    limit,
                    retry_after,
                    "Rate limit exceeded"
                );
                MetricsRecorder::record_rate_limit_decision(&self.name, "denied");
            }
        }

        Ok(admission)
    }

    /// Derive the key and caller class from a request, then check it
    pub async fn check_request(&self, ctx: &RequestContext) -> Result<Admission> {
        let key = self.config.key_for(ctx);
        self.check(&key, ctx.is_authenticated()).await
    }

    /// Ok when admitted; `RateLimitExceeded` otherwise
    pub async fn is_allowed(&self, ctx: &RequestContext) -> Result<()> {
        match self.check_request(ctx).await? {
            Admission::Allowed { .. } => Ok(()),
            Admission::Denied { retry_after } => Err(AppError::RateLimitExceeded { retry_after }),
        }
    }

    /// Number of live counters in this limiter's store
    pub async fn tracked_keys(&self) -> Result<usize> {
        self.store.len().await
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("backend", &self.store.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::key::KeyScope;
    use axum::http::Method;

    fn ctx(path: &str, ip: &str, identity: Option<&str>) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: path.to_string(),
            forwarded_for: Some(ip.to_string()),
            client_addr: None,
            identity: identity.map(str::to_string),
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        assert!(matches!(
            RateLimiter::new("bad", RateLimitConfig::new(0, 60)),
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticated_limit_is_higher() {
        let limiter = RateLimiter::new(
            "expenses",
            RateLimitConfig::new(50, 60).with_auth_limit(200),
        )
        .unwrap();

        let anonymous = ctx("/api/expenses", "1.2.3.4", None);
        for _ in 0..50 {
            assert!(limiter.is_allowed(&anonymous).await.is_ok());
        }
        assert!(matches!(
            limiter.is_allowed(&anonymous).await,
            Err(AppError::RateLimitExceeded { .. })
        ));

        let user = ctx("/api/expenses", "1.2.3.4", Some("42"));
        for _ in 0..200 {
            assert!(limiter.is_allowed(&user).await.is_ok());
        }
        assert!(limiter.is_allowed(&user).await.is_err());
    }

    #[tokio::test]
    async fn test_per_route_scope_isolates_paths() {
        let limiter = RateLimiter::new("strict", RateLimitConfig::new(1, 60)).unwrap();

        assert!(limiter.is_allowed(&ctx("/a", "1.2.3.4", None)).await.is_ok());
        assert!(limiter.is_allowed(&ctx("/a", "1.2.3.4", None)).await.is_err());
        assert!(limiter.is_allowed(&ctx("/b", "1.2.3.4", None)).await.is_ok());
        assert_eq!(limiter.tracked_keys().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_global_scope_shares_counter_across_paths() {
        let limiter = RateLimiter::new(
            "global",
            RateLimitConfig::new(1, 60).with_scope(KeyScope::Global),
        )
        .unwrap();

        assert!(limiter.is_allowed(&ctx("/a", "1.2.3.4", None)).await.is_ok());
        assert!(limiter.is_allowed(&ctx("/b", "1.2.3.4", None)).await.is_err());
    }

    #[tokio::test]
    async fn test_denial_reports_retry_after() {
        let limiter = RateLimiter::new("strict", RateLimitConfig::new(1, 60)).unwrap();

        limiter.check("k", false).await.unwrap();
        match limiter.check("k", false).await.unwrap() {
            Admission::Denied { retry_after } => assert!((59..=60).contains(&retry_after)),
            other => panic!("expected denial, got {:?}", other),
        }
    }
}
