//! Database operations for the `active_sessions` table.
//!
//! One session row per user, keyed on `user_id`. A new login replaces the
//! row in place, so the most recent login always wins and every older
//! session id stops validating immediately.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Joined session/user/client context loaded once per authenticated request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthContextRow {
    pub user_id: i64,
    pub client_id: i64,
    pub session_id: Uuid,
    pub business_ids: Vec<i64>,
}

/// Installs `session_id` as the user's single active session.
///
/// Any previously active session for the user is overwritten (last-write-wins).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn replace_session(
    pool: &PgPool,
    user_id: i64,
    session_id: Uuid,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO active_sessions (user_id, session_id) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET \
             session_id = EXCLUDED.session_id, \
             created_at = NOW()",
    )
    .bind(user_id)
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the user's current session id, or `None` if logged out.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_session_id(pool: &PgPool, user_id: i64) -> Result<Option<Uuid>, DbError> {
    let row = sqlx::query_scalar::<_, Uuid>(
        "SELECT session_id FROM active_sessions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes the user's session row (logout).
///
/// Returns `true` when a session existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_session(pool: &PgPool, user_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM active_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Resolves a presented session id to its user and client context.
///
/// Returns `None` when the session id matches no row or the user has been
/// deactivated; either way the caller treats the session as invalid.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_auth_context(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<AuthContextRow>, DbError> {
    let row = sqlx::query_as::<_, AuthContextRow>(
        "SELECT u.id AS user_id, u.client_id, s.session_id, c.business_ids \
         FROM active_sessions s \
         JOIN client_users u ON u.id = s.user_id AND u.is_active = true \
         JOIN clients c ON c.id = u.client_id \
         WHERE s.session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes session rows whose user has been deactivated.
///
/// Returns the number of rows removed. Run daily by the server's
/// maintenance scheduler.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_inactive_user_sessions(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM active_sessions s \
         USING client_users u \
         WHERE u.id = s.user_id AND u.is_active = false",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Session timestamp for diagnostics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_session_created_at(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let row = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM active_sessions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
