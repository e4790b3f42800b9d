//! Aggregate queries backing the chart endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Per-day post counts split by sentiment.
///
/// Days without posts produce no row; the consumer fills gaps.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailySentimentRow {
    pub day: NaiveDate,
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

/// Per-platform post count and mean relevance.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformBreakdownRow {
    pub platform: String,
    pub post_count: i64,
    pub avg_relevance: Option<Decimal>,
}

/// Whole-window sentiment and criticism totals.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SentimentTotalsRow {
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub criticism: i64,
}

/// One business's aggregate tuple in a competitor comparison.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessAggregateRow {
    pub business_id: i64,
    pub business_name: String,
    pub post_count: i64,
    pub avg_relevance: Option<Decimal>,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

/// Daily post/sentiment series for one business over a window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_daily_sentiment(
    pool: &PgPool,
    business_id: i64,
    start_at: DateTime<Utc>,
    end_before: DateTime<Utc>,
) -> Result<Vec<DailySentimentRow>, DbError> {
    let rows = sqlx::query_as::<_, DailySentimentRow>(
        "SELECT (posted_at AT TIME ZONE 'UTC')::date AS day, \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE sentiment = 'positive') AS positive, \
                COUNT(*) FILTER (WHERE sentiment = 'neutral')  AS neutral, \
                COUNT(*) FILTER (WHERE sentiment = 'negative') AS negative \
         FROM business_posts \
         WHERE business_id = $1 AND posted_at >= $2 AND posted_at < $3 \
         GROUP BY day \
         ORDER BY day",
    )
    .bind(business_id)
    .bind(start_at)
    .bind(end_before)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Post count and mean relevance per platform code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_platform_breakdown(
    pool: &PgPool,
    business_id: i64,
    start_at: DateTime<Utc>,
    end_before: DateTime<Utc>,
) -> Result<Vec<PlatformBreakdownRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformBreakdownRow>(
        "SELECT platform, \
                COUNT(*) AS post_count, \
                AVG(relevance_pct) AS avg_relevance \
         FROM business_posts \
         WHERE business_id = $1 AND posted_at >= $2 AND posted_at < $3 \
         GROUP BY platform \
         ORDER BY post_count DESC, platform",
    )
    .bind(business_id)
    .bind(start_at)
    .bind(end_before)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sentiment and criticism totals for one business over a window.
///
/// Always returns a row; an empty window yields all zeros.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sentiment_totals(
    pool: &PgPool,
    business_id: i64,
    start_at: DateTime<Utc>,
    end_before: DateTime<Utc>,
) -> Result<SentimentTotalsRow, DbError> {
    let row = sqlx::query_as::<_, SentimentTotalsRow>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE sentiment = 'positive') AS positive, \
                COUNT(*) FILTER (WHERE sentiment = 'neutral')  AS neutral, \
                COUNT(*) FILTER (WHERE sentiment = 'negative') AS negative, \
                COUNT(*) FILTER (WHERE is_criticism)           AS criticism \
         FROM business_posts \
         WHERE business_id = $1 AND posted_at >= $2 AND posted_at < $3",
    )
    .bind(business_id)
    .bind(start_at)
    .bind(end_before)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Aggregate tuple for each of the given businesses over one window.
///
/// Businesses with no posts in the window still appear, with zero counts,
/// so a comparison never silently drops a competitor.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn compare_businesses(
    pool: &PgPool,
    business_ids: &[i64],
    start_at: DateTime<Utc>,
    end_before: DateTime<Utc>,
) -> Result<Vec<BusinessAggregateRow>, DbError> {
    let rows = sqlx::query_as::<_, BusinessAggregateRow>(
        "SELECT b.id AS business_id, \
                b.name AS business_name, \
                COUNT(p.note_id) AS post_count, \
                AVG(p.relevance_pct) AS avg_relevance, \
                COUNT(p.note_id) FILTER (WHERE p.sentiment = 'positive') AS positive, \
                COUNT(p.note_id) FILTER (WHERE p.sentiment = 'neutral')  AS neutral, \
                COUNT(p.note_id) FILTER (WHERE p.sentiment = 'negative') AS negative \
         FROM businesses b \
         LEFT JOIN business_posts p \
           ON p.business_id = b.id AND p.posted_at >= $2 AND p.posted_at < $3 \
         WHERE b.id = ANY($1) \
         GROUP BY b.id, b.name \
         ORDER BY array_position($1, b.id)",
    )
    .bind(business_ids)
    .bind(start_at)
    .bind(end_before)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
