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
        invitation_dto::{CreateInvitationPayload, RespondInvitationPayload},
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::user::UserRole,
    utils::pagination::Pagination,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/invitations",
    request_body = CreateInvitationPayload,
    responses(
        (status = 201, description = "Invitation sent", body = crate::models::invitation::Invitation),
        (status = 402, description = "Contact limit reached"),
        (status = 404, description = "Job or candidate not found"),
        (status = 409, description = "Candidate already invited or applied")
    )
)]
#[axum::debug_handler]
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateInvitationPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    payload.validate()?;
    let invitation = state
        .invitation_service
        .invite(&state.usage_service, employer_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

#[axum::debug_handler]
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let pagination = Pagination::new(query.page, query.per_page);
    let page = match claims.role()? {
        UserRole::Candidate => {
            state
                .invitation_service
                .list_for_candidate(user_id, pagination)
                .await?
        }
        UserRole::Employer => {
            state
                .invitation_service
                .list_for_employer(user_id, pagination)
                .await?
        }
        UserRole::Admin => return Err(Error::Forbidden("Administrators have no invitations".into())),
    };
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/invitations/{id}/respond",
    params(
        ("id" = Uuid, Path, description = "Invitation ID")
    ),
    request_body = RespondInvitationPayload,
    responses(
        (status = 200, description = "Invitation accepted or declined", body = crate::models::invitation::Invitation),
        (status = 404, description = "Invitation not found"),
        (status = 409, description = "Invitation already answered")
    )
)]
#[axum::debug_handler]
pub async fn respond_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondInvitationPayload>,
) -> Result<impl IntoResponse> {
    let candidate_id = claims.require_role(UserRole::Candidate)?;
    let invitation = state
        .invitation_service
        .respond(id, candidate_id, payload.accept)
        .await?;
    Ok(Json(invitation))
}
