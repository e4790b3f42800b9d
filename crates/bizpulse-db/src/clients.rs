//! Database operations for the `clients` and `client_users` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `clients` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub business_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `client_users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientUserRow {
    pub id: i64,
    pub client_id: i64,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Returns a client by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_client(pool: &PgPool, id: i64) -> Result<Option<ClientRow>, DbError> {
    let row = sqlx::query_as::<_, ClientRow>(
        "SELECT id, name, business_ids, created_at FROM clients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns an active user by email, or `None` if not found.
///
/// Deactivated users are invisible to login.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ClientUserRow>, DbError> {
    let row = sqlx::query_as::<_, ClientUserRow>(
        "SELECT id, client_id, email, password_hash, password_salt, is_active, created_at \
         FROM client_users \
         WHERE email = $1 AND is_active = true",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a client and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_client(pool: &PgPool, name: &str) -> Result<ClientRow, DbError> {
    let row = sqlx::query_as::<_, ClientRow>(
        "INSERT INTO clients (name) VALUES ($1) \
         RETURNING id, name, business_ids, created_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Appends a business id to a client's `business_ids`, skipping duplicates.
///
/// Returns `true` when the array changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn add_business_to_client(
    pool: &PgPool,
    client_id: i64,
    business_id: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE clients \
         SET business_ids = array_append(business_ids, $2) \
         WHERE id = $1 AND NOT ($2 = ANY(business_ids))",
    )
    .bind(client_id)
    .bind(business_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Creates a client user with pre-hashed credentials and returns the row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including the email
/// uniqueness constraint).
pub async fn create_client_user(
    pool: &PgPool,
    client_id: i64,
    email: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<ClientUserRow, DbError> {
    let row = sqlx::query_as::<_, ClientUserRow>(
        "INSERT INTO client_users (client_id, email, password_hash, password_salt) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, client_id, email, password_hash, password_salt, is_active, created_at",
    )
    .bind(client_id)
    .bind(email)
    .bind(password_hash)
    .bind(password_salt)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces a user's stored credentials.
///
/// Returns `true` when a matching active user existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_user_password(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE client_users \
         SET password_hash = $2, password_salt = $3 \
         WHERE email = $1 AND is_active = true",
    )
    .bind(email)
    .bind(password_hash)
    .bind(password_salt)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
