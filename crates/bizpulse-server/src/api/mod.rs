mod auth;
mod businesses;
mod charts;
mod posts;
mod topics;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use bizpulse_core::{DateWindow, WindowPreset};

use crate::middleware::{
    enforce_rate_limit, request_id, require_session, AuthedClient, RateLimitState, RequestId,
    SessionAuthState,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cookie_secure: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" | "session_invalid" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &bizpulse_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Resolves the `from`/`to`/`window` query parameters into a [`DateWindow`].
pub(super) fn resolve_window(
    request_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    window: Option<&str>,
) -> Result<DateWindow, ApiError> {
    let preset = match window {
        None => WindowPreset::default(),
        Some(raw) => WindowPreset::from_param(raw).ok_or_else(|| {
            ApiError::new(
                request_id,
                "validation_error",
                format!("unknown window preset: {raw}"),
            )
        })?,
    };

    DateWindow::resolve_utc(from, to, preset)
        .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

/// Enforces tenancy: the business id must belong to the authed client.
///
/// Out-of-tenancy ids report `not_found` so existence cannot be probed.
pub(super) fn require_owned_business(
    auth: &AuthedClient,
    business_id: i64,
    request_id: &str,
) -> Result<(), ApiError> {
    if auth.business_ids.contains(&business_id) {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "not_found",
            "business not found",
        ))
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: SessionAuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/session", get(auth::check_session))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/businesses", get(businesses::list_businesses))
        .route("/api/v1/businesses/{id}", get(businesses::get_business))
        .route(
            "/api/v1/businesses/{id}/competitors",
            get(businesses::list_competitors),
        )
        .route("/api/v1/businesses/{id}/posts", get(posts::list_posts))
        .route("/api/v1/businesses/{id}/topics", get(topics::list_topics))
        .route(
            "/api/v1/businesses/{id}/charts/daily",
            get(charts::daily_series),
        )
        .route(
            "/api/v1/businesses/{id}/charts/platforms",
            get(charts::platform_breakdown),
        )
        .route(
            "/api/v1/businesses/{id}/charts/sentiment",
            get(charts::sentiment_summary),
        )
        .route(
            "/api/v1/businesses/{id}/compare",
            get(charts::compare_competitors),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(auth, require_session)),
        )
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let session_auth = SessionAuthState {
        pool: state.pool.clone(),
    };

    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/auth/login", post(auth::login));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(session_auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match bizpulse_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests;
