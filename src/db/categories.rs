// Database queries for expense categories

use crate::db::schema::{Category, Page};
use crate::db::users::is_unique_violation;
use crate::domain::NewCategory;
use crate::errors::{AppError, Result};
use sqlx::PgPool;
use uuid::Uuid;

const DUPLICATE_NAME: &str = "A category with this name already exists";

fn map_duplicate(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::BadRequest(DUPLICATE_NAME.to_string())
    } else {
        AppError::Database(err)
    }
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid, page: Page) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, user_id, name, description, created_at
        FROM expense_categories
        WHERE user_id = $1
        ORDER BY name
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Fetch a category only if it belongs to `user_id`
pub async fn get_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, user_id, name, description, created_at
        FROM expense_categories
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

/// True when the user already has a category called `name`, ignoring `except`
pub async fn name_taken(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM expense_categories
            WHERE user_id = $1 AND name = $2 AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(except)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

pub async fn create(pool: &PgPool, user_id: Uuid, category: &NewCategory) -> Result<Category> {
    if name_taken(pool, user_id, &category.name, None).await? {
        return Err(AppError::BadRequest(DUPLICATE_NAME.to_string()));
    }

    let created = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO expense_categories (id, user_id, name, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, name, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&category.name)
    .bind(&category.description)
    .fetch_one(pool)
    .await
    .map_err(map_duplicate)?;

    tracing::debug!(category_id = %created.id, user_id = %user_id, "Created category");

    Ok(created)
}

/// Rename and redescribe a category; `Ok(None)` when it is not the user's
pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    category: &NewCategory,
) -> Result<Option<Category>> {
    if get_for_user(pool, user_id, id).await?.is_none() {
        return Ok(None);
    }

    if name_taken(pool, user_id, &category.name, Some(id)).await? {
        return Err(AppError::BadRequest(DUPLICATE_NAME.to_string()));
    }

    let updated = sqlx::query_as::<_, Category>(
        r#"
        UPDATE expense_categories
        SET name = $3, description = $4
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, description, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&category.name)
    .bind(&category.description)
    .fetch_optional(pool)
    .await
    .map_err(map_duplicate)?;

    Ok(updated)
}

/// Delete a category and its expenses; false when it is not the user's
pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM expense_categories WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
