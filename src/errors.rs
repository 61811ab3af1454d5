use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),

    // Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // Authentication errors
    #[error("LOGIN_BAD_CREDENTIALS")]
    InvalidCredentials,
    #[error("REGISTER_USER_ALREADY_EXISTS")]
    UserAlreadyExists,
    #[error("UPDATE_USER_EMAIL_ALREADY_EXISTS")]
    EmailAlreadyInUse,
    #[error("{0}")]
    InvalidPassword(String),
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
    #[error("Token validation failed: {0}")]
    TokenValidation(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,

    // Resource errors
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    InvalidInput(String),

    // Rate limiting
    #[error("Rate limit exceeded. Try again in {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Cryptographic errors
    #[error("Cryptographic error: {0}")]
    Cryptographic(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::DatabaseMigration(_)
            | AppError::Redis(_)
            | AppError::TokenGeneration(_)
            | AppError::Configuration(_)
            | AppError::Cryptographic(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidCredentials
            | AppError::UserAlreadyExists
            | AppError::EmailAlreadyInUse
            | AppError::InvalidPassword(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TokenValidation(_) | AppError::TokenExpired | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            ErrorKind::InvalidToken => AppError::TokenValidation("Invalid token".to_string()),
            _ => AppError::TokenValidation(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => AppError::InvalidInput(rejection.body_text()),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => AppError::InvalidInput(rejection.body_text()),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

// Implement IntoResponse for Axum
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let detail = match &self {
            AppError::Database(_) | AppError::DatabaseMigration(_) => {
                tracing::error!("Database error: {:?}", self);
                "Internal server error".to_string()
            }
            AppError::Redis(_) => {
                tracing::error!("Redis error: {:?}", self);
                "Internal server error".to_string()
            }
            AppError::TokenGeneration(_)
            | AppError::Configuration(_)
            | AppError::Cryptographic(_)
            | AppError::Internal(_) => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
            AppError::TokenValidation(_) | AppError::TokenExpired => {
                tracing::debug!("Rejected bearer token: {}", self);
                "Unauthorized".to_string()
            }
            _ => self.to_string(),
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();

        match &self {
            AppError::RateLimitExceeded { retry_after } if *retry_after > 0 => {
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            AppError::TokenValidation(_) | AppError::TokenExpired | AppError::Unauthorized => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            _ => {}
        }

        response
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
