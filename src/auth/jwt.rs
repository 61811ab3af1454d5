// JWT access token generation and validation

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| AppError::TokenValidation(format!("Invalid subject UUID: {}", e)))
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// Bearer token response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerToken {
    pub access_token: String,
    pub token_type: String,
}

impl BearerToken {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// HS256 token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_seconds: i64,
}

impl JwtManager {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiration_seconds: config.jwt_expiration_seconds,
        })
    }

    pub fn generate_access_token(&self, user_id: Uuid) -> Result<String> {
        self.generate_with_lifetime(user_id, self.expiration_seconds)
    }

    fn generate_with_lifetime(&self, user_id: Uuid, lifetime_seconds: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_seconds)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::TokenGeneration(format!("Failed to encode JWT: {}", e)))
    }

    /// Validate signature, issuer, audience and expiry
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        if claims.is_expired() {
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }
}
