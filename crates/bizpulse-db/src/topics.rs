//! Database operations for the `business_topics` table.

use sqlx::PgPool;

use crate::DbError;

/// Topic listing row with its post count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicSummaryRow {
    pub topic: String,
    pub topic_type: String,
    pub post_count: i32,
}

/// Returns the topics assigned to a business, largest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_topic_summaries(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<TopicSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, TopicSummaryRow>(
        "SELECT topic, topic_type, cardinality(note_ids) AS post_count \
         FROM business_topics \
         WHERE business_id = $1 \
         ORDER BY cardinality(note_ids) DESC, topic",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the note ids mapped to a topic, or `None` when the topic does
/// not exist for this business.
///
/// `topic_type` narrows the lookup when given; a business can carry the
/// same topic label under different types.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_topic_note_ids(
    pool: &PgPool,
    business_id: i64,
    topic: &str,
    topic_type: Option<&str>,
) -> Result<Option<Vec<String>>, DbError> {
    let row = sqlx::query_scalar::<_, Vec<String>>(
        "SELECT note_ids \
         FROM business_topics \
         WHERE business_id = $1 \
           AND topic = $2 \
           AND ($3::TEXT IS NULL OR topic_type = $3) \
         LIMIT 1",
    )
    .bind(business_id)
    .bind(topic)
    .bind(topic_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
