use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    dto::package_dto::{AssignPackagePayload, LimitCheckQuery, PackageListQuery, UsageResponse},
    error::Result,
    middleware::auth::Claims,
    models::package::UsageAction,
    services::usage_service::evaluate,
    AppState,
};

#[axum::debug_handler]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<PackageListQuery>,
) -> Result<impl IntoResponse> {
    let packages = state
        .usage_service
        .list_packages(query.audience.as_deref())
        .await?;
    Ok(Json(json!({ "items": packages })))
}

#[utoipa::path(
    get,
    path = "/api/usage",
    responses(
        (status = 200, description = "Active subscription with per-action gate results", body = UsageResponse)
    )
)]
#[axum::debug_handler]
pub async fn my_usage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let subscription = state
        .usage_service
        .current_usage(claims.user_id()?)
        .await?;
    let now = Utc::now();
    let checks = [
        UsageAction::Contact,
        UsageAction::Application,
        UsageAction::JobPost,
    ]
    .into_iter()
    .map(|action| evaluate(subscription.as_ref(), action, now))
    .collect();
    Ok(Json(UsageResponse {
        subscription,
        checks,
    }))
}

#[utoipa::path(
    get,
    path = "/api/usage/check",
    params(
        ("action" = String, Query, description = "contact, application or job_post")
    ),
    responses(
        (status = 200, description = "Whether the action is currently allowed", body = crate::services::usage_service::LimitCheck)
    )
)]
#[axum::debug_handler]
pub async fn check_usage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LimitCheckQuery>,
) -> Result<impl IntoResponse> {
    let check = state
        .usage_service
        .check_limit(claims.user_id()?, query.action)
        .await?;
    Ok(Json(check))
}

#[axum::debug_handler]
pub async fn assign_package(
    State(state): State<AppState>,
    Json(payload): Json<AssignPackagePayload>,
) -> Result<impl IntoResponse> {
    let subscription = state
        .usage_service
        .assign_package(payload.user_id, payload.package_id)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}
