use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{ApplicationListQuery, ApplyPayload, UpdateApplicationStatusPayload},
    error::{Error, Result},
    middleware::auth::Claims,
    models::user::UserRole,
    utils::pagination::Pagination,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = crate::models::application::Application),
        (status = 402, description = "Application limit reached"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    let candidate_id = claims.require_role(UserRole::Candidate)?;
    payload.validate()?;
    let application = state
        .application_service
        .apply(&state.usage_service, candidate_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let pagination = Pagination::new(query.page, query.per_page);
    let page = match claims.role()? {
        UserRole::Candidate => {
            state
                .application_service
                .list_for_candidate(user_id, query.status.as_deref(), pagination)
                .await?
        }
        UserRole::Employer => {
            state
                .application_service
                .list_for_employer(user_id, None, query.status.as_deref(), pagination)
                .await?
        }
        UserRole::Admin => {
            return Err(Error::Forbidden("Administrators have no applications".into()))
        }
    };
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get_for_participant(id, claims.user_id()?)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationStatusPayload,
    responses(
        (status = 200, description = "Status changed and candidate notified", body = crate::models::application::Application),
        (status = 403, description = "Caller is not the job's employer"),
        (status = 409, description = "Transition not allowed from the current status")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let application = state
        .application_service
        .update_status(id, employer_id, payload.status)
        .await?;
    Ok(Json(application))
}
