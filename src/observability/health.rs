use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ComponentStatus,
    /// Present only when the rate limiters share counters through Redis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<ComponentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    pub message: Option<String>,
}

impl ComponentStatus {
    fn from_result(component: &str, result: crate::errors::Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                status: "ok".to_string(),
                message: None,
            },
            Err(e) => {
                tracing::warn!(component, error = %e, "Readiness check failed");
                Self {
                    status: "error".to_string(),
                    message: Some(format!("{} check failed", component)),
                }
            }
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub struct HealthChecker {
    db_pool: PgPool,
    redis_manager: Option<ConnectionManager>,
}

impl HealthChecker {
    pub fn new(db_pool: PgPool, redis_manager: Option<ConnectionManager>) -> Self {
        Self {
            db_pool,
            redis_manager,
        }
    }

    /// Liveness check - is the process serving?
    pub fn liveness(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: None,
        }
    }

    /// Readiness check - are the backing stores reachable?
    pub async fn readiness(&self) -> HealthStatus {
        let database = ComponentStatus::from_result(
            "Database",
            crate::db::health_check(&self.db_pool).await,
        );

        let redis = match &self.redis_manager {
            Some(manager) => Some(ComponentStatus::from_result(
                "Redis",
                crate::redis::health_check(manager).await,
            )),
            None => None,
        };

        let healthy = database.is_ok() && redis.as_ref().map_or(true, ComponentStatus::is_ok);

        HealthStatus {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks: Some(HealthChecks { database, redis }),
        }
    }
}
