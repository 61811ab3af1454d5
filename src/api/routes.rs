use crate::{
    api::{auth, categories, echo, expenses, health, users},
    auth::{resolve_identity, JwtManager, PasswordPolicy},
    config::{Config, LimiterSettings, RateLimitBackend, RateLimitSettings, SecurityConfig},
    errors::{AppError, Result},
    observability::{track_metrics, HealthChecker},
    rate_limit::{enforce_rate_limit, rate_limit_middleware, RateLimitMiddleware, RateLimiter},
    redis::RedisStore,
};
use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt: Arc<JwtManager>,
    pub password_policy: Arc<PasswordPolicy>,
    pub health_checker: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(config: &Config, db_pool: PgPool, redis_manager: Option<ConnectionManager>) -> Result<Self> {
        Ok(Self {
            jwt: Arc::new(JwtManager::new(&config.auth)?),
            password_policy: Arc::new(PasswordPolicy::from_config(&config.auth)),
            health_checker: Arc::new(HealthChecker::new(db_pool.clone(), redis_manager)),
            db_pool,
        })
    }
}

/// The three independent limiters the service runs
pub struct RateLimiters {
    /// Loose limiter in front of every route
    pub global: RateLimitMiddleware,
    /// Strict limiter that only sees the auth endpoints
    pub auth: RateLimitMiddleware,
    /// Route-level limiter on the expense endpoints
    pub expenses: Arc<RateLimiter>,
}

impl RateLimiters {
    /// Each limiter gets its own store, so counters never mix
    pub fn from_settings(
        settings: &RateLimitSettings,
        redis_manager: Option<&ConnectionManager>,
    ) -> Result<Self> {
        let build = |name: &str, limiter: &LimiterSettings| -> Result<RateLimiter> {
            let config = limiter.to_rate_limit_config()?;
            match (settings.backend, redis_manager) {
                (RateLimitBackend::Memory, _) => RateLimiter::new(name, config),
                (RateLimitBackend::Redis, Some(manager)) => RateLimiter::with_store(
                    name,
                    config,
                    Arc::new(RedisStore::new(manager.clone(), name)),
                ),
                (RateLimitBackend::Redis, None) => Err(AppError::Configuration(
                    "Redis rate limit backend selected without a Redis connection".to_string(),
                )),
            }
        };

        Ok(Self {
            global: RateLimitMiddleware::new(
                build("global", &settings.global)?,
                settings.global.exclude_paths.clone(),
            ),
            auth: RateLimitMiddleware::new(
                build("auth", &settings.auth)?,
                settings.auth.exclude_paths.clone(),
            ),
            expenses: Arc::new(build("expenses", &settings.expenses)?),
        })
    }
}

/// Assemble the HTTP surface.
///
/// Layer order, outermost first: CORS, trace, metrics, identity, global
/// limiter, auth limiter. Identity runs before the limiters so that they
/// can key on the user.
pub fn create_router(config: &Config, state: AppState, limiters: RateLimiters) -> Router {
    let mut router = Router::new()
        .nest(
            "/api",
            api_routes(config.observability.metrics_enabled, limiters.expenses),
        )
        .layer(from_fn_with_state(limiters.auth, rate_limit_middleware))
        .layer(from_fn_with_state(limiters.global, rate_limit_middleware))
        .layer(from_fn_with_state(state.jwt.clone(), resolve_identity));

    if config.observability.metrics_enabled {
        router = router.layer(from_fn(track_metrics));
    }

    router = router.layer(TraceLayer::new_for_http());

    if config.security.cors_enabled {
        router = router.layer(cors_layer(&config.security));
    }

    router.with_state(state)
}

fn api_routes(metrics_enabled: bool, expense_limiter: Arc<RateLimiter>) -> Router<AppState> {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/echo", get(echo::get_echo).post(echo::post_echo))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/expenses", expense_routes(expense_limiter));

    if metrics_enabled {
        router = router.route("/metrics", get(health::metrics));
    }

    router
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/jwt/login", post(auth::login))
        .route("/jwt/logout", post(auth::logout))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::get_me).patch(users::update_me))
        .route(
            "/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/:id",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
}

fn expense_routes(limiter: Arc<RateLimiter>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/:id",
            get(expenses::get_expense)
                .patch(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .route_layer(from_fn_with_state(limiter, enforce_rate_limit))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if security.cors_allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
