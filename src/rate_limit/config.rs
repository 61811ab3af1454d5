use crate::errors::{AppError, Result};
use crate::rate_limit::key::{default_key, KeyScope, RequestContext};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Custom key derivation, replacing [`default_key`] entirely
pub type KeyFunc = Arc<dyn Fn(&RequestContext) -> String + Send + Sync>;

/// Immutable configuration for one limiter instance
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Max admitted requests per window for anonymous callers
    pub requests_limit: u32,
    /// Fixed window length
    pub window_size: Duration,
    /// Max admitted requests per window for authenticated callers.
    /// Falls back to `requests_limit` when unset.
    pub auth_requests_limit: Option<u32>,
    pub scope: KeyScope,
    key_func: Option<KeyFunc>,
}

impl RateLimitConfig {
    pub fn new(requests_limit: u32, window_seconds: u64) -> Self {
        Self {
            requests_limit,
            window_size: Duration::from_secs(window_seconds),
            auth_requests_limit: None,
            scope: KeyScope::PerRoute,
            key_func: None,
        }
    }

    pub fn with_auth_limit(mut self, limit: u32) -> Self {
        self.auth_requests_limit = Some(limit);
        self
    }

    pub fn with_scope(mut self, scope: KeyScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_key_func<F>(mut self, key_func: F) -> Self
    where
        F: Fn(&RequestContext) -> String + Send + Sync + 'static,
    {
        self.key_func = Some(Arc::new(key_func));
        self
    }

    /// Effective ceiling for a caller
    pub fn limit_for(&self, is_authenticated: bool) -> u32 {
        if is_authenticated {
            self.auth_requests_limit.unwrap_or(self.requests_limit)
        } else {
            self.requests_limit
        }
    }

    /// Throttling key for a request
    pub fn key_for(&self, ctx: &RequestContext) -> String {
        match &self.key_func {
            Some(key_func) => key_func(ctx),
            None => default_key(ctx, self.scope),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.requests_limit == 0 {
            return Err(AppError::Configuration(
                "requests_limit must be positive".to_string(),
            ));
        }

        if self.window_size.is_zero() {
            return Err(AppError::Configuration(
                "window_size must be positive".to_string(),
            ));
        }

        if self.auth_requests_limit == Some(0) {
            return Err(AppError::Configuration(
                "auth_requests_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for RateLimitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitConfig")
            .field("requests_limit", &self.requests_limit)
            .field("window_size", &self.window_size)
            .field("auth_requests_limit", &self.auth_requests_limit)
            .field("scope", &self.scope)
            .field("custom_key", &self.key_func.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn anonymous(path: &str) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: path.to_string(),
            forwarded_for: Some("1.2.3.4".to_string()),
            client_addr: None,
            identity: None,
        }
    }

    #[test]
    fn test_auth_limit_falls_back_to_baseline() {
        let config = RateLimitConfig::new(50, 60);
        assert_eq!(config.limit_for(false), 50);
        assert_eq!(config.limit_for(true), 50);

        let config = config.with_auth_limit(200);
        assert_eq!(config.limit_for(false), 50);
        assert_eq!(config.limit_for(true), 200);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        assert!(RateLimitConfig::new(0, 60).validate().is_err());
        assert!(RateLimitConfig::new(10, 0).validate().is_err());
        assert!(RateLimitConfig::new(10, 60).with_auth_limit(0).validate().is_err());
        assert!(RateLimitConfig::new(10, 60).validate().is_ok());
    }

    #[test]
    fn test_scope_changes_key() {
        let ctx = anonymous("/api/expenses");
        let per_route = RateLimitConfig::new(10, 60);
        let global = RateLimitConfig::new(10, 60).with_scope(KeyScope::Global);

        assert_eq!(per_route.key_for(&ctx), "ip:1.2.3.4:path:/api/expenses");
        assert_eq!(global.key_for(&ctx), "ip:1.2.3.4");
    }

    #[test]
    fn test_custom_key_func_overrides_default() {
        let config = RateLimitConfig::new(10, 60).with_key_func(|ctx| format!("custom:{}", ctx.path));
        assert_eq!(config.key_for(&anonymous("/x")), "custom:/x");
    }
}
