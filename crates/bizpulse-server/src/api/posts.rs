//! Filtered, paginated post listing.
//!
//! Translates the portal's filter UI state (date range, platform,
//! sentiment, relevance threshold, criticism flag, free-text search, topic,
//! sort, page) into one counted and one paged query.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bizpulse_core::{platform, Page, PageRequest};
use bizpulse_db::{PostFilters, PostSort};

use crate::middleware::{AuthedClient, RequestId};

use super::{
    map_db_error, require_owned_business, resolve_window, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

const SENTIMENTS: [&str; 3] = ["positive", "neutral", "negative"];

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub window: Option<String>,
    pub platform: Option<String>,
    pub sentiment: Option<String>,
    pub min_relevance: Option<i16>,
    pub criticism_only: Option<bool>,
    pub search: Option<String>,
    pub topic: Option<String>,
    pub topic_type: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PostItem {
    pub note_id: String,
    pub platform: String,
    pub platform_name: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_en: Option<String>,
    pub sentiment: Option<String>,
    pub relevance_pct: Option<i16>,
    pub is_criticism: bool,
    pub criticism_summary: Option<String>,
    pub author_name: Option<String>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct WindowInfo {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub(super) struct PostListData {
    pub items: Vec<PostItem>,
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub window: WindowInfo,
}

impl From<bizpulse_db::PostRow> for PostItem {
    fn from(row: bizpulse_db::PostRow) -> Self {
        Self {
            platform_name: platform::display_name_for(&row.platform),
            note_id: row.note_id,
            platform: row.platform,
            title: row.title,
            content: row.content,
            content_en: row.content_en,
            sentiment: row.sentiment,
            relevance_pct: row.relevance_pct,
            is_criticism: row.is_criticism,
            criticism_summary: row.criticism_summary,
            author_name: row.author_name,
            posted_at: row.posted_at,
        }
    }
}

pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<PostListData>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;

    let window = resolve_window(&req_id.0, query.from, query.to, query.window.as_deref())?;

    if let Some(sentiment) = query.sentiment.as_deref() {
        if !SENTIMENTS.contains(&sentiment) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("unknown sentiment: {sentiment}"),
            ));
        }
    }

    let sort = match query.sort.as_deref() {
        None => PostSort::default(),
        Some(raw) => PostSort::from_param(raw).ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown sort order: {raw}"),
            )
        })?,
    };

    // A topic filter narrows the listing to the note ids mapped to it.
    let note_ids = match query.topic.as_deref() {
        None => None,
        Some(topic) => {
            let ids = bizpulse_db::get_topic_note_ids(
                &state.pool,
                business_id,
                topic,
                query.topic_type.as_deref(),
            )
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

            Some(ids.ok_or_else(|| {
                ApiError::new(req_id.0.clone(), "not_found", "topic not found")
            })?)
        }
    };

    let filters = PostFilters {
        business_id,
        start_at: window.start_at(),
        end_before: window.end_exclusive(),
        platform: query.platform.as_deref(),
        sentiment: query.sentiment.as_deref(),
        min_relevance: query.min_relevance,
        criticism_only: query.criticism_only.unwrap_or(false),
        search: query.search.as_deref(),
        note_ids,
    };

    let total_items = bizpulse_db::count_posts(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // Clamp an overshooting page request to the last page instead of
    // returning an empty listing.
    let request = PageRequest::normalize(query.page, query.page_size);
    let page = Page::clamp(request, total_items);

    let rows = bizpulse_db::list_posts(&state.pool, &filters, sort, page.page_size, page.offset())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PostListData {
            items: rows.into_iter().map(PostItem::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
            window: WindowInfo {
                from: window.from,
                to: window.to,
            },
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
