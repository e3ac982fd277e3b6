mod common;

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Json, Router};
use common::{call, init, lazy_app, token};
use talent_marketplace::middleware::rate_limit::{new_rps_state, rps_middleware};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = lazy_app();
    let (status, body) = call(&app, "GET", "/api/alerts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");
}

#[tokio::test]
async fn forged_tokens_are_rejected() {
    let app = lazy_app();
    let (status, body) = call(&app, "GET", "/api/inbox/poll", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn administrators_cannot_own_alerts() {
    let app = lazy_app();
    let admin = token(Uuid::new_v4(), "admin");
    let (status, _) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&admin),
        Some(json!({ "title": "Everything", "criteria": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn candidate_alerts_refuse_job_only_fields() {
    let app = lazy_app();
    let employer = token(Uuid::new_v4(), "employer");
    let (status, body) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&employer),
        Some(json!({
            "title": "Senior engineers",
            "criteria": { "experience_levels": ["senior"] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("experience_levels"));
}

#[tokio::test]
async fn blank_alert_titles_fail_validation() {
    let app = lazy_app();
    let candidate = token(Uuid::new_v4(), "candidate");
    let (status, _) = call(
        &app,
        "POST",
        "/api/alerts",
        Some(&candidate),
        Some(json!({ "title": "", "criteria": { "sectors": ["Technology"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn candidates_cannot_post_jobs() {
    let app = lazy_app();
    let candidate = token(Uuid::new_v4(), "candidate");
    let (status, _) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&candidate),
        Some(json!({ "title": "Backend Engineer", "company": "Acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inverted_salary_range_is_rejected_before_the_gate() {
    let app = lazy_app();
    let employer = token(Uuid::new_v4(), "employer");
    let (status, _) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&employer),
        Some(json!({
            "title": "Backend Engineer",
            "company": "Acme",
            "salary_min": 120000,
            "salary_max": 80000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_search_refuses_candidate_only_fields() {
    let app = lazy_app();
    let candidate = token(Uuid::new_v4(), "candidate");
    let (status, _) = call(
        &app,
        "POST",
        "/api/jobs/search",
        Some(&candidate),
        Some(json!({ "experience_years_min": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn package_assignment_is_admin_only() {
    let app = lazy_app();
    let employer = token(Uuid::new_v4(), "employer");
    let (status, body) = call(
        &app,
        "POST",
        "/api/admin/subscriptions",
        Some(&employer),
        Some(json!({ "user_id": Uuid::new_v4(), "package_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn openapi_document_lists_alert_routes() {
    let app = lazy_app();
    let (status, body) = call(&app, "GET", "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/alerts"].is_object());
    assert!(body["paths"]["/api/inbox/poll"].is_object());
}

#[tokio::test]
async fn rate_limit_buckets_follow_the_verified_caller() {
    init();
    let app = Router::new()
        .route("/ping", get(|| async { Json(json!({ "ok": true })) }))
        .layer(from_fn_with_state(new_rps_state(1), rps_middleware));

    // Made-up tokens do not buy a fresh budget.
    let (status, _) = call(&app, "GET", "/ping", Some("bogus-one"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", "/ping", Some("bogus-two"), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limit_exceeded");
    let (status, _) = call(&app, "GET", "/ping", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let user = token(Uuid::new_v4(), "candidate");
    let (status, _) = call(&app, "GET", "/ping", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/ping", Some(&user), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
