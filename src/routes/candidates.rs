use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{candidate_dto::UpsertProfilePayload, job_dto::SearchQuery},
    error::Result,
    middleware::auth::Claims,
    models::{alert::AlertKind, filter_criteria::FilterCriteria, user::UserRole},
    services::matching_service::MatchQuery,
    utils::pagination::Pagination,
    AppState,
};

#[utoipa::path(
    put,
    path = "/api/candidates/me",
    request_body = UpsertProfilePayload,
    responses(
        (status = 200, description = "Profile saved; visible profiles are matched against candidate alerts", body = crate::models::candidate::CandidateProfile),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller is not a candidate")
    )
)]
#[axum::debug_handler]
pub async fn upsert_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpsertProfilePayload>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(UserRole::Candidate)?;
    payload.validate()?;
    let profile = state.candidate_service.upsert_profile(user_id, payload).await?;
    if profile.is_visible {
        if let Err(e) = state.alert_service.notify_candidate_alerts(&profile).await {
            tracing::error!(candidate_id = %profile.user_id, error = ?e, "candidate alert delivery failed");
        }
    }
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(UserRole::Candidate)?;
    let profile = state.candidate_service.get(user_id).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state
        .candidate_service
        .get_visible(id, claims.user_id()?)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/candidates/search",
    request_body = FilterCriteria,
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("since" = Option<String>, Query, description = "Only profiles updated after this instant")
    ),
    responses(
        (status = 200, description = "Visible candidate profiles matching the criteria"),
        (status = 400, description = "Criteria contain job-only fields"),
        (status = 403, description = "Caller is not an employer")
    )
)]
#[axum::debug_handler]
pub async fn search_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
    Json(criteria): Json<FilterCriteria>,
) -> Result<impl IntoResponse> {
    claims.require_role(UserRole::Employer)?;
    criteria.validate_for(AlertKind::Candidate)?;
    let page = state
        .matching_service
        .matching_candidates(
            &criteria,
            &MatchQuery {
                pagination: Pagination::new(query.page, query.per_page),
                since: query.since,
            },
        )
        .await?;
    Ok(Json(page))
}
