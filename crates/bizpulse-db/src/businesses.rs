//! Database operations for the `businesses` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub search_keywords: Vec<String>,
    pub similar_business_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the businesses with the given ids, ordered by name.
///
/// Ids with no matching row are silently absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_businesses_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<Vec<BusinessRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessRow>(
        "SELECT id, name, city, business_type, search_keywords, similar_business_ids, \
                created_at, updated_at \
         FROM businesses \
         WHERE id = ANY($1) \
         ORDER BY name",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single business by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_business(pool: &PgPool, id: i64) -> Result<Option<BusinessRow>, DbError> {
    let row = sqlx::query_as::<_, BusinessRow>(
        "SELECT id, name, city, business_type, search_keywords, similar_business_ids, \
                created_at, updated_at \
         FROM businesses \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
