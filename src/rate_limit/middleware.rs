use crate::errors::AppError;
use crate::rate_limit::key::RequestContext;
use crate::rate_limit::limiter::RateLimiter;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Global rate limiting layer.
///
/// Several instances may be stacked, each with its own limiter and
/// exclusion list.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
    exclude_paths: Vec<String>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: RateLimiter, exclude_paths: Vec<String>) -> Self {
        Self {
            limiter: Arc::new(limiter),
            exclude_paths,
        }
    }

    /// Excluded paths bypass the limiter by prefix match
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub async fn dispatch(&self, request: Request, next: Next) -> Result<Response, AppError> {
        let ctx = RequestContext::from_request(&request);
        if self.is_excluded(&ctx.path) {
            return Ok(next.run(request).await);
        }

        self.limiter.is_allowed(&ctx).await?;

        Ok(next.run(request).await)
    }
}

/// Rate limiting middleware, for `axum::middleware::from_fn_with_state`
pub async fn rate_limit_middleware(
    State(layer): State<RateLimitMiddleware>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    layer.dispatch(request, next).await
}

/// Per-route rate limiting, for `Router::route_layer`. No exclusions apply.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = RequestContext::from_request(&request);
    limiter.is_allowed(&ctx).await?;

    Ok(next.run(request).await)
}
