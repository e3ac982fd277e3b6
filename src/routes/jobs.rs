use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::ApplicationListQuery,
        job_dto::{CreateJobPayload, JobListQuery, SearchQuery, UpdateJobPayload},
    },
    error::Result,
    middleware::auth::Claims,
    models::{alert::AlertKind, filter_criteria::FilterCriteria, job::Job, user::UserRole},
    services::matching_service::MatchQuery,
    utils::pagination::Pagination,
    AppState,
};

/// Alert delivery never fails the request that published the job.
async fn notify_alerts(state: &AppState, job: &Job) {
    if let Err(e) = state.alert_service.notify_job_alerts(job).await {
        tracing::error!(job_id = %job.id, error = ?e, "job alert delivery failed");
    }
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Invalid payload"),
        (status = 402, description = "Job posting limit reached"),
        (status = 403, description = "Caller is not an employer")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    payload.validate()?;
    let job = state
        .job_service
        .create(&state.usage_service, employer_id, payload)
        .await?;
    if job.is_published() {
        notify_alerts(&state, &job).await;
    }
    Ok((StatusCode::CREATED, Json(job)))
}

#[axum::debug_handler]
pub async fn list_own_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let page = state
        .job_service
        .list_for_employer(
            employer_id,
            query.status.as_deref(),
            Pagination::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/jobs/search",
    request_body = FilterCriteria,
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("since" = Option<String>, Query, description = "Only jobs published after this instant")
    ),
    responses(
        (status = 200, description = "Published jobs matching the criteria"),
        (status = 400, description = "Criteria contain candidate-only fields")
    )
)]
#[axum::debug_handler]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Json(criteria): Json<FilterCriteria>,
) -> Result<impl IntoResponse> {
    criteria.validate_for(AlertKind::Job)?;
    let page = state
        .matching_service
        .matching_jobs(
            &criteria,
            &MatchQuery {
                pagination: Pagination::new(query.page, query.per_page),
                since: query.since,
            },
        )
        .await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_visible_to(id, claims.user_id()?).await?;
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    payload.validate()?;
    let job = state.job_service.update(id, employer_id, payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/publish",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job published and matching job alerts notified", body = Job),
        (status = 409, description = "Job is closed")
    )
)]
#[axum::debug_handler]
pub async fn publish_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let (job, published_now) = state.job_service.publish(id, employer_id).await?;
    if published_now {
        notify_alerts(&state, &job).await;
    }
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn close_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let job = state.job_service.close(id, employer_id).await?;
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn list_job_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let job = state.job_service.get_owned(id, employer_id).await?;
    let page = state
        .application_service
        .list_for_employer(
            employer_id,
            Some(job.id),
            query.status.as_deref(),
            Pagination::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page))
}
