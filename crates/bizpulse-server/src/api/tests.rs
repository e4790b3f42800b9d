use super::*;
use axum::body::{to_bytes, Body};
use axum::http::{header::SET_COOKIE, Request};
use chrono::Duration as ChronoDuration;
use tower::ServiceExt;
use uuid::Uuid;

// -------------------------------------------------------------------------
// DB-free unit tests
// -------------------------------------------------------------------------

#[test]
fn api_error_session_invalid_maps_to_unauthorized() {
    let response = ApiError::new("req-1", "session_invalid", "superseded").into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn require_owned_business_hides_foreign_ids_as_not_found() {
    let auth = AuthedClient {
        user_id: 1,
        client_id: 1,
        session_id: Uuid::new_v4(),
        business_ids: vec![10, 11],
    };
    assert!(require_owned_business(&auth, 10, "req-1").is_ok());
    let err = require_owned_business(&auth, 99, "req-1").expect_err("foreign id");
    assert_eq!(err.error.code, "not_found");
}

#[test]
fn resolve_window_rejects_unknown_preset() {
    let err = resolve_window("req-1", None, None, Some("90d")).expect_err("bad preset");
    assert_eq!(err.error.code, "validation_error");
}

#[test]
fn post_item_serializes_platform_display_name() {
    let item = posts::PostItem {
        note_id: "n1".to_string(),
        platform: "xhs".to_string(),
        platform_name: "Xiaohongshu".to_string(),
        title: None,
        content: Some("great".to_string()),
        content_en: None,
        sentiment: Some("positive".to_string()),
        relevance_pct: Some(88),
        is_criticism: false,
        criticism_summary: None,
        author_name: None,
        posted_at: Utc::now(),
    };
    let json = serde_json::to_string(&item).expect("serialize");
    assert!(json.contains("\"platform_name\":\"Xiaohongshu\""));
    assert!(json.contains("\"relevance_pct\":88"));
}

// -------------------------------------------------------------------------
// Seed helpers
// -------------------------------------------------------------------------

fn test_app(pool: sqlx::PgPool) -> Router {
    build_app(
        AppState {
            pool,
            cookie_secure: false,
        },
        default_rate_limit_state(),
    )
}

async fn seed_business(pool: &sqlx::PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO businesses (name, city, business_type) \
         VALUES ($1, 'Shanghai', 'restaurant') RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("seed business")
}

/// Seeds a client owning `business_ids` and a user with the given password.
async fn seed_tenant(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    business_ids: &[i64],
) -> (i64, i64) {
    let client_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO clients (name, business_ids) VALUES ('Acme', $1) RETURNING id",
    )
    .bind(business_ids)
    .fetch_one(pool)
    .await
    .expect("seed client");

    let salt = bizpulse_core::password::generate_salt();
    let hash = bizpulse_core::password::hash_password(password, &salt);
    let user = bizpulse_db::create_client_user(pool, client_id, email, &hash, &salt)
        .await
        .expect("seed user");

    (client_id, user.id)
}

async fn seed_post(pool: &sqlx::PgPool, business_id: i64, note_id: &str, days_ago: i64) {
    sqlx::query(
        "INSERT INTO business_posts (note_id, business_id, platform, content, posted_at) \
         VALUES ($1, $2, 'xhs', 'content', $3)",
    )
    .bind(note_id)
    .bind(business_id)
    .bind(Utc::now() - ChronoDuration::days(days_ago))
    .execute(pool)
    .await
    .expect("seed post");
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Option<String>) {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToOwned::to_owned);
    (status, cookie)
}

async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("cookie", cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// -------------------------------------------------------------------------
// Auth and session enforcement
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_is_public(pool: sqlx::PgPool) {
    let app = test_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn login_sets_session_cookie(pool: sqlx::PgPool) {
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[]).await;
    let app = test_app(pool);

    let (status, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.expect("set-cookie header");
    let value = cookie.strip_prefix("session_id=").expect("cookie name");
    value.parse::<Uuid>().expect("cookie value is a uuid");
}

#[sqlx::test(migrations = "../../migrations")]
async fn login_rejects_wrong_password(pool: sqlx::PgPool) {
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[]).await;
    let app = test_app(pool);

    let (status, cookie) = login(&app, "owner@acme.test", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn protected_route_requires_cookie(pool: sqlx::PgPool) {
    let app = test_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/businesses")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Middleware rejections use the same envelope as handler errors.
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"]["code"].as_str(), Some("unauthorized"));
    assert_eq!(json["meta"]["request_id"].as_str(), Some("req-abc"));
    assert!(json["meta"]["timestamp"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_login_supersedes_first_session(pool: sqlx::PgPool) {
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[]).await;
    let app = test_app(pool);

    let (_, first_cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let first_cookie = first_cookie.expect("first cookie");
    let (_, second_cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let second_cookie = second_cookie.expect("second cookie");

    let (status, body) = get_with_cookie(&app, "/api/v1/auth/session", &first_cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"].as_str(), Some("session_invalid"));

    let (status, body) = get_with_cookie(&app, "/api/v1/auth/session", &second_cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["logged_in_at"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn logout_invalidates_session(pool: sqlx::PgPool) {
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[]).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/logout")
                .header("cookie", &cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = get_with_cookie(&app, "/api/v1/auth/session", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -------------------------------------------------------------------------
// Tenancy and business routes
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn businesses_are_scoped_to_the_client(pool: sqlx::PgPool) {
    let mine = seed_business(&pool, "My Cafe").await;
    let other = seed_business(&pool, "Someone Elses Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[mine]).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let (status, body) = get_with_cookie(&app, "/api/v1/businesses", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"].as_i64(), Some(mine));

    let (status, body) =
        get_with_cookie(&app, &format!("/api/v1/businesses/{other}"), &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "foreign business must 404");
    assert_eq!(body["error"]["code"].as_str(), Some("not_found"));
}

// -------------------------------------------------------------------------
// Post listing
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn post_listing_defaults_to_trailing_week_excluding_today(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Window Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    seed_post(&pool, biz, "recent", 2).await;
    seed_post(&pool, biz, "today", 0).await;
    seed_post(&pool, biz, "ancient", 40).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let (status, body) =
        get_with_cookie(&app, &format!("/api/v1/businesses/{biz}/posts"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1, "today and 40-day-old posts excluded");
    assert_eq!(items[0]["note_id"].as_str(), Some("recent"));
    assert_eq!(body["data"]["total_items"].as_i64(), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn post_listing_clamps_overshooting_page(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Page Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    for i in 0..3 {
        seed_post(&pool, biz, &format!("n{i}"), 2).await;
    }
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let uri = format!("/api/v1/businesses/{biz}/posts?page=99&page_size=2");
    let (status, body) = get_with_cookie(&app, &uri, &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"].as_i64(), Some(2), "clamped to last page");
    assert_eq!(body["data"]["total_pages"].as_i64(), Some(2));
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn post_listing_rejects_unknown_sort(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Sort Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let uri = format!("/api/v1/businesses/{biz}/posts?sort=random");
    let (status, body) = get_with_cookie(&app, &uri, &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn post_listing_unknown_topic_is_not_found(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Topic Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let uri = format!("/api/v1/businesses/{biz}/posts?topic=nope");
    let (status, body) = get_with_cookie(&app, &uri, &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"].as_str(), Some("not_found"));
}

// -------------------------------------------------------------------------
// Charts
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn compare_marks_self_and_includes_competitors(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Main Cafe").await;
    let rival = seed_business(&pool, "Rival Cafe").await;
    sqlx::query("UPDATE businesses SET similar_business_ids = ARRAY[$2::BIGINT] WHERE id = $1")
        .bind(biz)
        .bind(rival)
        .execute(&pool)
        .await
        .expect("link competitor");
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    seed_post(&pool, biz, "m1", 2).await;
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let (status, body) =
        get_with_cookie(&app, &format!("/api/v1/businesses/{biz}/compare"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["is_self"].as_bool(), Some(true));
    assert_eq!(data[0]["post_count"].as_i64(), Some(1));
    assert_eq!(data[1]["business_id"].as_i64(), Some(rival));
    assert_eq!(data[1]["post_count"].as_i64(), Some(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn sentiment_chart_counts_criticism(pool: sqlx::PgPool) {
    let biz = seed_business(&pool, "Chart Cafe").await;
    seed_tenant(&pool, "owner@acme.test", "hunter2", &[biz]).await;
    sqlx::query(
        "INSERT INTO business_posts \
             (note_id, business_id, platform, sentiment, is_criticism, posted_at) \
         VALUES ('c1', $1, 'xhs', 'negative', true, $2)",
    )
    .bind(biz)
    .bind(Utc::now() - ChronoDuration::days(2))
    .execute(&pool)
    .await
    .expect("seed post");
    let app = test_app(pool);

    let (_, cookie) = login(&app, "owner@acme.test", "hunter2").await;
    let cookie = cookie.expect("cookie");

    let uri = format!("/api/v1/businesses/{biz}/charts/sentiment");
    let (status, body) = get_with_cookie(&app, &uri, &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_i64(), Some(1));
    assert_eq!(body["data"]["negative"].as_i64(), Some(1));
    assert_eq!(body["data"]["criticism"].as_i64(), Some(1));
}
