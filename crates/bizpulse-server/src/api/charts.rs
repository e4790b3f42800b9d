//! Chart aggregate endpoints: daily series, platform breakdown, sentiment
//! totals, and the competitor comparison.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bizpulse_core::platform;

use crate::middleware::{AuthedClient, RequestId};

use super::{
    map_db_error, require_owned_business, resolve_window, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DailyPoint {
    pub day: NaiveDate,
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct PlatformSlice {
    pub platform: String,
    pub platform_name: String,
    pub post_count: i64,
    pub avg_relevance: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct SentimentSummaryData {
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub criticism: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct CompareItem {
    pub business_id: i64,
    pub business_name: String,
    pub is_self: bool,
    pub post_count: i64,
    pub avg_relevance: Option<Decimal>,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

pub(super) async fn daily_series(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<DailyPoint>>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;
    let window = resolve_window(&req_id.0, query.from, query.to, query.window.as_deref())?;

    let rows = bizpulse_db::list_daily_sentiment(
        &state.pool,
        business_id,
        window.start_at(),
        window.end_exclusive(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| DailyPoint {
            day: row.day,
            total: row.total,
            positive: row.positive,
            neutral: row.neutral,
            negative: row.negative,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn platform_breakdown(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<PlatformSlice>>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;
    let window = resolve_window(&req_id.0, query.from, query.to, query.window.as_deref())?;

    let rows = bizpulse_db::list_platform_breakdown(
        &state.pool,
        business_id,
        window.start_at(),
        window.end_exclusive(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| PlatformSlice {
            platform_name: platform::display_name_for(&row.platform),
            platform: row.platform,
            post_count: row.post_count,
            avg_relevance: row.avg_relevance,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn sentiment_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<SentimentSummaryData>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;
    let window = resolve_window(&req_id.0, query.from, query.to, query.window.as_deref())?;

    let row = bizpulse_db::sentiment_totals(
        &state.pool,
        business_id,
        window.start_at(),
        window.end_exclusive(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SentimentSummaryData {
            total: row.total,
            positive: row.positive,
            neutral: row.neutral,
            negative: row.negative,
            criticism: row.criticism,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Aggregates for the business and each configured competitor, one row per
/// business, in business-then-competitors order.
pub(super) async fn compare_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<CompareItem>>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;
    let window = resolve_window(&req_id.0, query.from, query.to, query.window.as_deref())?;

    let business = bizpulse_db::get_business(&state.pool, business_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "business not found"))?;

    let mut ids = Vec::with_capacity(1 + business.similar_business_ids.len());
    ids.push(business_id);
    ids.extend(
        business
            .similar_business_ids
            .iter()
            .copied()
            .filter(|id| *id != business_id),
    );

    let rows = bizpulse_db::compare_businesses(
        &state.pool,
        &ids,
        window.start_at(),
        window.end_exclusive(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CompareItem {
            is_self: row.business_id == business_id,
            business_id: row.business_id,
            business_name: row.business_name,
            post_count: row.post_count,
            avg_relevance: row.avg_relevance,
            positive: row.positive,
            neutral: row.neutral,
            negative: row.negative,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
