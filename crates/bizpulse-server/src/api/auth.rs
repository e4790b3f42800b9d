//! Login, logout, and the session-check endpoint.
//!
//! Login replaces the user's single active session row and issues the
//! `session_id` cookie. The check endpoint is what a portal frontend polls
//! (and calls on window focus / route change) to detect that a newer login
//! elsewhere has superseded this session.

use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthedClient, RequestId, SESSION_COOKIE};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const TEN_YEARS_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginData {
    pub user_id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub business_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    pub user_id: i64,
    pub client_id: i64,
    pub session_id: Uuid,
    pub logged_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct LogoutData {
    pub logged_out: bool,
}

fn session_cookie(session_id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(TEN_YEARS_SECS))
        .build()
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginData>>), ApiError> {
    let user = bizpulse_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // Unknown email and wrong password produce the same error.
    let Some(user) = user else {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid email or password",
        ));
    };

    if !bizpulse_core::password::verify_password(
        &body.password,
        &user.password_salt,
        &user.password_hash,
    ) {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid email or password",
        ));
    }

    let client = bizpulse_db::get_client(&state.pool, user.client_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            tracing::error!(user_id = user.id, "client row missing for user");
            ApiError::new(req_id.0.clone(), "internal_error", "client record missing")
        })?;

    // Last write wins: any session from an earlier login stops validating now.
    let session_id = Uuid::new_v4();
    bizpulse_db::replace_session(&state.pool, user.id, session_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id = user.id, client_id = client.id, "login succeeded");

    let jar = jar.add(session_cookie(session_id, state.cookie_secure));
    Ok((
        jar,
        Json(ApiResponse {
            data: LoginData {
                user_id: user.id,
                client_id: client.id,
                client_name: client.name,
                business_ids: client.business_ids,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn check_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    let logged_in_at = bizpulse_db::sessions::get_session_created_at(&state.pool, auth.user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SessionData {
            user_id: auth.user_id,
            client_id: auth.client_id,
            session_id: auth.session_id,
            logged_in_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthedClient>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<LogoutData>>), ApiError> {
    let logged_out = bizpulse_db::delete_session(&state.pool, auth.user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id = auth.user_id, "logout");

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    Ok((
        jar,
        Json(ApiResponse {
            data: LogoutData { logged_out },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
