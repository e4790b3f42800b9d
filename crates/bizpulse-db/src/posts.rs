//! Filtered listing queries over the `business_posts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `business_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub note_id: String,
    pub business_id: i64,
    pub platform: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_en: Option<String>,
    pub sentiment: Option<String>,
    pub relevance_pct: Option<i16>,
    pub is_criticism: bool,
    pub criticism_summary: Option<String>,
    pub author_name: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
}

/// Sort orders exposed by the post listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    Latest,
    Oldest,
    Relevance,
}

impl PostSort {
    #[must_use]
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            "relevance" => Some(Self::Relevance),
            _ => None,
        }
    }

    fn as_param(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Oldest => "oldest",
            Self::Relevance => "relevance",
        }
    }
}

/// Filter state for the post listing, already resolved by the caller.
///
/// `start_at`/`end_before` come from the resolved date window; `note_ids`
/// is `Some` when a topic filter restricts the listing to its posts.
#[derive(Debug, Clone)]
pub struct PostFilters<'a> {
    pub business_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_before: DateTime<Utc>,
    pub platform: Option<&'a str>,
    pub sentiment: Option<&'a str>,
    pub min_relevance: Option<i16>,
    pub criticism_only: bool,
    pub search: Option<&'a str>,
    pub note_ids: Option<Vec<String>>,
}

/// Escapes LIKE metacharacters so a search term matches literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

const POST_FILTER_WHERE: &str = "business_id = $1 \
       AND posted_at >= $2 AND posted_at < $3 \
       AND ($4::TEXT IS NULL OR platform = $4) \
       AND ($5::TEXT IS NULL OR sentiment = $5) \
       AND ($6::SMALLINT IS NULL OR relevance_pct >= $6) \
       AND (NOT $7::BOOL OR is_criticism) \
       AND ($8::TEXT IS NULL \
            OR title ILIKE '%' || $8 || '%' \
            OR content ILIKE '%' || $8 || '%' \
            OR content_en ILIKE '%' || $8 || '%') \
       AND ($9::TEXT[] IS NULL OR note_id = ANY($9))";

/// Counts posts matching the filters, for pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts(pool: &PgPool, filters: &PostFilters<'_>) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM business_posts WHERE {POST_FILTER_WHERE}");

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(filters.business_id)
        .bind(filters.start_at)
        .bind(filters.end_before)
        .bind(filters.platform)
        .bind(filters.sentiment)
        .bind(filters.min_relevance)
        .bind(filters.criticism_only)
        .bind(filters.search.map(escape_like))
        .bind(filters.note_ids.as_deref())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Returns one page of posts matching the filters.
///
/// The sort key is selected inside the query via `CASE` so the SQL stays a
/// single static statement: `oldest` orders ascending by `posted_at`,
/// `relevance` descending by `relevance_pct` (nulls last), and `latest`
/// falls through to the default `posted_at DESC` key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(
    pool: &PgPool,
    filters: &PostFilters<'_>,
    sort: PostSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostRow>, DbError> {
    let sql = format!(
        "SELECT note_id, business_id, platform, title, content, content_en, sentiment, \
                relevance_pct, is_criticism, criticism_summary, author_name, posted_at, scraped_at \
         FROM business_posts \
         WHERE {POST_FILTER_WHERE} \
         ORDER BY \
             CASE WHEN $10 = 'oldest' THEN posted_at END ASC, \
             CASE WHEN $10 = 'relevance' THEN relevance_pct END DESC NULLS LAST, \
             posted_at DESC \
         LIMIT $11 OFFSET $12"
    );

    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(filters.business_id)
        .bind(filters.start_at)
        .bind(filters.end_before)
        .bind(filters.platform)
        .bind(filters.sentiment)
        .bind(filters.min_relevance)
        .bind(filters.criticism_only)
        .bind(filters.search.map(escape_like))
        .bind(filters.note_ids.as_deref())
        .bind(sort.as_param())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
