// Expense category endpoints

use crate::api::extract::{ApiJson, ApiPath, ApiQuery, Pagination};
use crate::api::routes::AppState;
use crate::auth::CurrentUser;
use crate::db::categories;
use crate::domain::{CategoryCreate, CategoryRead, CategoryUpdate};
use crate::errors::{AppError, Result};
use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

const CATEGORY: &str = "Category";

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<Pagination>,
) -> Result<Json<Vec<CategoryRead>>> {
    let rows = categories::list_for_user(&state.db_pool, user.id, params.page()?).await?;
    Ok(Json(rows.into_iter().map(CategoryRead::from).collect()))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryRead>)> {
    let category = req.validate()?;
    let created = categories::create(&state.db_pool, user.id, &category).await?;

    tracing::info!(category_id = %created.id, user_id = %user.id, "Category created");

    Ok((StatusCode::CREATED, Json(CategoryRead::from(created))))
}

/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CategoryRead>> {
    let category = categories::get_for_user(&state.db_pool, user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(CATEGORY))?;

    Ok(Json(CategoryRead::from(category)))
}

/// PATCH /api/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CategoryUpdate>,
) -> Result<Json<CategoryRead>> {
    // Ownership first so a foreign id is a 404 even with a bad body
    if categories::get_for_user(&state.db_pool, user.id, id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(CATEGORY));
    }

    let category = req.validate()?;
    let updated = categories::update(&state.db_pool, user.id, id, &category)
        .await?
        .ok_or_else(|| AppError::not_found(CATEGORY))?;

    tracing::info!(category_id = %id, user_id = %user.id, "Category updated");

    Ok(Json(CategoryRead::from(updated)))
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    if !categories::delete(&state.db_pool, user.id, id).await? {
        return Err(AppError::not_found(CATEGORY));
    }

    tracing::info!(category_id = %id, user_id = %user.id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
