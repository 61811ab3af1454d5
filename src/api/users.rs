// User profile and administration endpoints

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::routes::AppState;
use crate::auth::{hash_password, CurrentUser, PasswordPolicy, SuperUser};
use crate::db::users::{self, UserChanges};
use crate::domain::{validate_email, UserAdminUpdate, UserRead, UserUpdate};
use crate::errors::{AppError, Result};
use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

fn profile_changes(update: UserUpdate, policy: &PasswordPolicy) -> Result<UserChanges> {
    let email = update.email.as_deref().map(validate_email).transpose()?;

    let hashed_password = match update.password.as_deref() {
        Some(password) => {
            policy.validate(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    Ok(UserChanges {
        email,
        hashed_password,
        first_name: update.first_name,
        last_name: update.last_name,
        ..UserChanges::default()
    })
}

/// GET /api/users/me
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(UserRead::from(user))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<UserRead>> {
    let changes = profile_changes(update, &state.password_policy)?;

    let updated = users::update(&state.db_pool, user.id, &changes)
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::info!(user_id = %updated.id, "User updated own profile");

    Ok(Json(UserRead::from(updated)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserRead>> {
    let user = users::get_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(Json(UserRead::from(user)))
}

/// PATCH /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserAdminUpdate>,
) -> Result<Json<UserRead>> {
    let mut changes = profile_changes(update.profile, &state.password_policy)?;
    changes.is_active = update.is_active;
    changes.is_superuser = update.is_superuser;
    changes.is_verified = update.is_verified;

    let updated = users::update(&state.db_pool, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    tracing::info!(user_id = %updated.id, admin_id = %admin.id, "User updated by superuser");

    Ok(Json(UserRead::from(updated)))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    if !users::delete(&state.db_pool, id).await? {
        return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
    }

    tracing::info!(user_id = %id, admin_id = %admin.id, "User deleted by superuser");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_changes_validates_and_hashes() {
        let policy = PasswordPolicy::default();
        let update = UserUpdate {
            email: Some("New@Example.com".to_string()),
            password: Some("N3w!Password".to_string()),
            ..UserUpdate::default()
        };

        let changes = profile_changes(update, &policy).unwrap();
        assert_eq!(changes.email.as_deref(), Some("new@example.com"));
        assert!(changes
            .hashed_password
            .as_deref()
            .unwrap()
            .starts_with("$argon2id$"));
        assert!(changes.is_superuser.is_none());
    }

    #[test]
    fn test_profile_changes_rejects_weak_password() {
        let update = UserUpdate {
            password: Some("weak".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            profile_changes(update, &PasswordPolicy::default()),
            Err(AppError::InvalidPassword(_))
        ));
    }
}
