//! Topic drill-down listing.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::{AuthedClient, RequestId};

use super::{map_db_error, require_owned_business, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct TopicItem {
    pub topic: String,
    pub topic_type: String,
    pub post_count: i32,
}

pub(super) async fn list_topics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    Path(business_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TopicItem>>>, ApiError> {
    require_owned_business(&auth, business_id, &req_id.0)?;

    let rows = bizpulse_db::list_topic_summaries(&state.pool, business_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| TopicItem {
            topic: row.topic,
            topic_type: row.topic_type,
            post_count: row.post_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
