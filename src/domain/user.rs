// User request and response schemas

use crate::db::schema::User;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_EMAIL_LENGTH: usize = 320;

/// Lowercased, trimmed email, or 422 when it is not a plausible address
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let invalid = || AppError::InvalidInput("value is not a valid email address".to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(email)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Superuser update; may also change account flags
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAdminUpdate {
    #[serde(flatten)]
    pub profile: UserUpdate,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}
