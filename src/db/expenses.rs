// Database queries for expenses

use crate::db::schema::{Expense, Page};
use crate::domain::{ExpenseUpdate, NewExpense};
use crate::errors::Result;
use sqlx::PgPool;
use uuid::Uuid;

const EXPENSE_COLUMNS: &str = "id, user_id, category_id, name, description, amount_cents, \
     expense_date, is_recurring, created_at, updated_at";

/// Newest expense date first
pub async fn list_for_user(pool: &PgPool, user_id: Uuid, page: Page) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE user_id = $1 \
         ORDER BY expense_date DESC, created_at DESC OFFSET $2 LIMIT $3",
        EXPENSE_COLUMNS
    );

    let expenses = sqlx::query_as::<_, Expense>(&sql)
        .bind(user_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await?;

    Ok(expenses)
}

/// Fetch an expense only if it belongs to `user_id`
pub async fn get_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE id = $1 AND user_id = $2",
        EXPENSE_COLUMNS
    );

    let expense = sqlx::query_as::<_, Expense>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(expense)
}

pub async fn create(pool: &PgPool, user_id: Uuid, expense: &NewExpense) -> Result<Expense> {
    let sql = format!(
        "INSERT INTO expenses \
         (id, user_id, category_id, name, description, amount_cents, expense_date, is_recurring) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        EXPENSE_COLUMNS
    );

    let created = sqlx::query_as::<_, Expense>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expense.category_id)
        .bind(&expense.name)
        .bind(&expense.description)
        .bind(expense.amount.cents())
        .bind(expense.expense_date)
        .bind(expense.is_recurring)
        .fetch_one(pool)
        .await?;

    tracing::debug!(expense_id = %created.id, user_id = %user_id, "Created expense");

    Ok(created)
}

/// Apply a partial update; `Ok(None)` when the expense is not the user's
pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    changes: &ExpenseUpdate,
) -> Result<Option<Expense>> {
    let sql = format!(
        r#"
        UPDATE expenses SET
            name = COALESCE($3, name),
            amount_cents = COALESCE($4, amount_cents),
            expense_date = COALESCE($5, expense_date),
            description = CASE WHEN $9 THEN $6 ELSE description END,
            is_recurring = COALESCE($7, is_recurring),
            category_id = COALESCE($8, category_id),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        EXPENSE_COLUMNS
    );

    let updated = sqlx::query_as::<_, Expense>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(&changes.name)
        .bind(changes.amount.map(|amount| amount.cents()))
        .bind(changes.expense_date)
        .bind(changes.description.as_ref().and_then(Option::as_deref))
        .bind(changes.is_recurring)
        .bind(changes.category_id)
        .bind(changes.description.is_some())
        .fetch_optional(pool)
        .await?;

    Ok(updated)
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
