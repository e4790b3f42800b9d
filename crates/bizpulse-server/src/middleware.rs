use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Name of the session cookie issued at login.
pub const SESSION_COOKIE: &str = "session_id";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Authenticated tenant context, inserted by [`require_session`].
///
/// `business_ids` is the client's tenancy set; every business-scoped
/// handler checks membership before touching data.
#[derive(Debug, Clone)]
pub struct AuthedClient {
    pub user_id: i64,
    pub client_id: i64,
    pub session_id: Uuid,
    pub business_ids: Vec<i64>,
}

/// State for the session-check middleware.
#[derive(Clone)]
pub struct SessionAuthState {
    pub pool: PgPool,
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware validating the session cookie against the `active_sessions` row.
///
/// Every protected request re-checks the cookie's session id, so a session
/// superseded by a newer login on the same user fails on its very next
/// request. Invalid sessions get `session_invalid`, which the frontend
/// treats as a forced logout; missing or malformed cookies get
/// `unauthorized`.
pub async fn require_session(
    State(auth): State<SessionAuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = extract_session_cookie(req.headers()) else {
        return ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or malformed session cookie",
        )
        .into_response();
    };

    let context = match bizpulse_db::get_auth_context(&auth.pool, session_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            return ApiError::new(
                request_id_of(&req),
                "internal_error",
                "session lookup failed",
            )
            .into_response();
        }
    };

    let Some(context) = context else {
        return ApiError::new(
            request_id_of(&req),
            "session_invalid",
            "session superseded or logged out",
        )
        .into_response();
    };

    req.extensions_mut().insert(AuthedClient {
        user_id: context.user_id,
        client_id: context.client_id,
        session_id: context.session_id,
        business_ids: context.business_ids,
    });

    next.run(req).await
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(window);
        return ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

/// Request id installed by [`request_id`], which runs outside this stack.
fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(|| "unknown".to_string(), |id| id.0.clone())
}

/// Parses the `session_id` cookie from a Cookie header, if present and a
/// valid UUID.
fn extract_session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            value.parse::<Uuid>().ok()
        } else {
            None
        }
    })
}
