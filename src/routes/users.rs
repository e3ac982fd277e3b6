use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::user_dto::SyncUserPayload,
    error::Result,
    middleware::auth::Claims,
    AppState,
};

/// Records the caller in the local user table. Clients call this once after
/// signing in, before any other write.
#[axum::debug_handler]
pub async fn sync_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SyncUserPayload>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let role = claims.role()?;
    payload.validate()?;
    let email = claims.email.clone().unwrap_or_default();
    let full_name = payload
        .full_name
        .or_else(|| claims.name.clone())
        .unwrap_or_else(|| email.clone());
    let user = state
        .user_service
        .sync(user_id, &email, &full_name, role)
        .await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(claims.user_id()?).await?;
    Ok(Json(user))
}
