use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::shortlist_dto::ShortlistPayload,
    error::Result,
    middleware::auth::Claims,
    models::user::UserRole,
    AppState,
};

#[axum::debug_handler]
pub async fn list_shortlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    let items = state.shortlist_service.list(employer_id).await?;
    Ok(Json(json!({ "items": items })))
}

#[axum::debug_handler]
pub async fn save_to_shortlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(candidate_id): Path<Uuid>,
    Json(payload): Json<ShortlistPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    payload.validate()?;
    let entry = state
        .shortlist_service
        .save(employer_id, candidate_id, payload.note.as_deref())
        .await?;
    Ok(Json(entry))
}

#[axum::debug_handler]
pub async fn remove_from_shortlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.require_role(UserRole::Employer)?;
    state
        .shortlist_service
        .remove(employer_id, candidate_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
