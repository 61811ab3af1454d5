use expense_tracker::{
    api::{create_router, AppState, RateLimiters},
    config::{Config, RateLimitBackend},
    db::{create_pool, run_migrations},
    observability::init_tracing,
    redis::create_client,
    server::shutdown_signal,
    AppError,
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize tracing/logging
    init_tracing(&config.observability);

    tracing::info!("Starting Expense Tracker service");
    tracing::info!("Configuration loaded: {:?}", config.server);

    // Create database connection pool
    let db_pool = create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run database migrations
    run_migrations(&db_pool).await?;
    tracing::info!("Database migrations completed");

    // Redis is only needed when it backs the rate limiters
    let redis_manager = match config.rate_limit.backend {
        RateLimitBackend::Redis => {
            let url = config.rate_limit.redis_url.as_deref().ok_or_else(|| {
                AppError::Configuration("rate_limit.redis_url is required for the redis backend".to_string())
            })?;
            let manager = create_client(url).await?;
            tracing::info!("Redis connection established");
            Some(manager)
        }
        RateLimitBackend::Memory => None,
    };

    let limiters = RateLimiters::from_settings(&config.rate_limit, redis_manager.as_ref())?;
    let state = AppState::new(&config, db_pool, redis_manager)?;
    let app = create_router(&config, state, limiters);

    // Bind server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Expense Tracker service is ready to accept requests");

    // Client addresses feed the rate limiter keys
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Expense Tracker service stopped");

    Ok(())
}
