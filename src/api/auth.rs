// Authentication endpoints

use crate::api::extract::{ApiForm, ApiJson, ClientAddress};
use crate::api::routes::AppState;
use crate::auth::{
    hash_password, log_auth_event, verify_password, AuthEvent, BearerToken, CurrentUser,
};
use crate::db::schema::User;
use crate::db::users::{self, NewUser};
use crate::domain::{default_categories, validate_email, UserCreate, UserRead};
use crate::errors::{AppError, Result};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

/// OAuth2 password-grant style form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Check a password against a looked-up user.
///
/// Unknown emails still pay for one hash of the submitted password, so the
/// response time does not reveal which emails are registered. The password
/// is verified before the active flag is looked at.
fn authenticate<H>(user: Option<User>, password: &str, hash: H) -> Result<Option<User>>
where
    H: FnOnce(&str) -> Result<String>,
{
    let Some(user) = user else {
        hash(password)?;
        return Ok(None);
    };

    if !verify_password(password, &user.hashed_password)? || !user.is_active {
        return Ok(None);
    }

    Ok(Some(user))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    ApiJson(req): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<UserRead>)> {
    let email = validate_email(&req.email)?;
    state.password_policy.validate(&req.password)?;

    let new_user = NewUser {
        email: email.clone(),
        hashed_password: hash_password(&req.password)?,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let user = match users::create_with_categories(&state.db_pool, &new_user, &default_categories())
        .await
    {
        Ok(user) => user,
        Err(e) => {
            log_auth_event(AuthEvent::Register, &email, false, Some(&ip));
            return Err(e);
        }
    };

    log_auth_event(AuthEvent::Register, &user.email, true, Some(&ip));

    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// POST /api/auth/jwt/login
pub async fn login(
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<BearerToken>> {
    let email = form.username.trim().to_lowercase();

    let found = users::get_by_email(&state.db_pool, &email).await?;
    let user = match authenticate(found, &form.password, hash_password)? {
        Some(user) => user,
        None => {
            log_auth_event(AuthEvent::Login, &email, false, Some(&ip));
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = state.jwt.generate_access_token(user.id)?;
    log_auth_event(AuthEvent::Login, &user.email, true, Some(&ip));

    Ok(Json(BearerToken::new(token)))
}

/// POST /api/auth/jwt/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(
    CurrentUser(user): CurrentUser,
    ClientAddress(ip): ClientAddress,
) -> StatusCode {
    log_auth_event(AuthEvent::Logout, &user.email, true, Some(&ip));
    StatusCode::NO_CONTENT
}
