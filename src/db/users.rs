// Database queries for users

use crate::db::schema::User;
use crate::domain::NewCategory;
use crate::errors::{AppError, Result};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, hashed_password, is_active, is_superuser, is_verified, \
     first_name, last_name, created_at, updated_at";

/// Fields to set on a user; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Data for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Insert a user together with its starter categories in one transaction
pub async fn create_with_categories(
    pool: &PgPool,
    user: &NewUser,
    categories: &[NewCategory],
) -> Result<User> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO users (id, email, hashed_password, first_name, last_name) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        USER_COLUMNS
    );
    let created = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::UserAlreadyExists
            } else {
                AppError::Database(e)
            }
        })?;

    for category in categories {
        sqlx::query(
            "INSERT INTO expense_categories (id, user_id, name, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        user_id = %created.id,
        categories = categories.len(),
        "Created user with default categories"
    );

    Ok(created)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Apply changes; `Ok(None)` when the user does not exist
pub async fn update(pool: &PgPool, id: Uuid, changes: &UserChanges) -> Result<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            hashed_password = COALESCE($3, hashed_password),
            first_name = COALESCE($4, first_name),
            last_name = COALESCE($5, last_name),
            is_active = COALESCE($6, is_active),
            is_superuser = COALESCE($7, is_superuser),
            is_verified = COALESCE($8, is_verified),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.hashed_password)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.is_active)
        .bind(changes.is_superuser)
        .bind(changes.is_verified)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailAlreadyInUse
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(user)
}

/// Delete a user and, by cascade, everything they own
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
