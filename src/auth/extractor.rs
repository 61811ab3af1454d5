use crate::api::routes::AppState;
use crate::auth::middleware::Principal;
use crate::db::{schema::User, users};
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The authenticated, active user making the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or(AppError::Unauthorized)?;

        let user = users::get_by_id(&state.db_pool, principal.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "Rejected inactive user");
            return Err(AppError::Unauthorized);
        }

        Ok(CurrentUser(user))
    }
}

/// An active user with the superuser flag
#[derive(Debug, Clone)]
pub struct SuperUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for SuperUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            return Err(AppError::Forbidden);
        }

        Ok(SuperUser(user))
    }
}
