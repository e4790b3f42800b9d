//! Business lookup endpoints, scoped to the authed client's tenancy.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::{AuthedClient, RequestId};

use super::{map_db_error, require_owned_business, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BusinessItem {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub search_keywords: Vec<String>,
    pub competitor_ids: Vec<i64>,
}

impl From<bizpulse_db::BusinessRow> for BusinessItem {
    fn from(row: bizpulse_db::BusinessRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            city: row.city,
            business_type: row.business_type,
            search_keywords: row.search_keywords,
            competitor_ids: row.similar_business_ids,
        }
    }
}

pub(super) async fn list_businesses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
) -> Result<Json<ApiResponse<Vec<BusinessItem>>>, ApiError> {
    let rows = bizpulse_db::list_businesses_by_ids(&state.pool, &auth.business_ids)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(BusinessItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_business(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
) -> Result<Json<ApiResponse<BusinessItem>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;

    let row = bizpulse_db::get_business(&state.pool, business_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "business not found"))?;

    Ok(Json(ApiResponse {
        data: BusinessItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Lists the similar businesses configured on this business.
///
/// Competitors are readable even when outside the client's own tenancy:
/// they exist precisely to be compared against.
pub(super) async fn list_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<BusinessItem>>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;

    let business = bizpulse_db::get_business(&state.pool, business_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "business not found"))?;

    let rows = bizpulse_db::list_businesses_by_ids(&state.pool, &business.similar_business_ids)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(BusinessItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
