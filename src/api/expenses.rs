// Expense endpoints. Every route here sits behind the expense rate limiter.

use crate::api::extract::{ApiJson, ApiPath, ApiQuery, Pagination};
use crate::api::routes::AppState;
use crate::auth::CurrentUser;
use crate::db::{categories, expenses};
use crate::domain::{ExpenseCreate, ExpenseRead, ExpenseUpdate};
use crate::errors::{AppError, Result};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const EXPENSE: &str = "Expense";

async fn ensure_category_owned(pool: &PgPool, user_id: Uuid, category_id: Uuid) -> Result<()> {
    match categories::get_for_user(pool, user_id, category_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(
            "Category not found or doesn't belong to user".to_string(),
        )),
    }
}

/// GET /api/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<Pagination>,
) -> Result<Json<Vec<ExpenseRead>>> {
    let rows = expenses::list_for_user(&state.db_pool, user.id, params.page()?).await?;
    Ok(Json(rows.into_iter().map(ExpenseRead::from).collect()))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ExpenseCreate>,
) -> Result<(StatusCode, Json<ExpenseRead>)> {
    let expense = req.validate(Utc::now().date_naive())?;
    ensure_category_owned(&state.db_pool, user.id, expense.category_id).await?;

    let created = expenses::create(&state.db_pool, user.id, &expense).await?;

    tracing::info!(
        expense_id = %created.id,
        user_id = %user.id,
        amount = %expense.amount,
        "Expense created"
    );

    Ok((StatusCode::CREATED, Json(ExpenseRead::from(created))))
}

/// GET /api/expenses/:id
pub async fn get_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ExpenseRead>> {
    let expense = expenses::get_for_user(&state.db_pool, user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(EXPENSE))?;

    Ok(Json(ExpenseRead::from(expense)))
}

/// PATCH /api/expenses/:id
pub async fn update_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<ExpenseUpdate>,
) -> Result<Json<ExpenseRead>> {
    if expenses::get_for_user(&state.db_pool, user.id, id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(EXPENSE));
    }

    update.validate()?;
    if let Some(category_id) = update.category_id {
        ensure_category_owned(&state.db_pool, user.id, category_id).await?;
    }

    let updated = expenses::update(&state.db_pool, user.id, id, &update)
        .await?
        .ok_or_else(|| AppError::not_found(EXPENSE))?;

    tracing::info!(expense_id = %id, user_id = %user.id, "Expense updated");

    Ok(Json(ExpenseRead::from(updated)))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    if !expenses::delete(&state.db_pool, user.id, id).await? {
        return Err(AppError::not_found(EXPENSE));
    }

    tracing::info!(expense_id = %id, user_id = %user.id, "Expense deleted");

    Ok(StatusCode::NO_CONTENT)
}
