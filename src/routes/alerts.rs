use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::alert_dto::{AlertListResponse, AlertMatchesQuery, AlertPayload, AlertResponse},
    error::{Error, Result},
    middleware::auth::Claims,
    models::alert::AlertKind,
    services::matching_service::MatchQuery,
    utils::pagination::Pagination,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = AlertPayload,
    responses(
        (status = 201, description = "Alert created", body = AlertResponse),
        (status = 400, description = "Invalid title or criteria"),
        (status = 403, description = "Role cannot own alerts")
    )
)]
#[axum::debug_handler]
pub async fn create_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AlertPayload>,
) -> Result<impl IntoResponse> {
    let owner_id = claims.user_id()?;
    let kind = AlertKind::for_role(claims.role()?)
        .ok_or_else(|| Error::Forbidden("Administrators do not own alerts".into()))?;
    payload.validate()?;
    let alert = state
        .alert_service
        .create(owner_id, kind, &payload.title, &payload.criteria)
        .await?;
    Ok((StatusCode::CREATED, Json(AlertResponse::from(alert))))
}

#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "The caller's alerts with unseen match counts", body = AlertListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_alerts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let owner_id = claims.user_id()?;
    let alerts = state.alert_service.list_for_owner(owner_id).await?;
    Ok(Json(AlertListResponse {
        items: alerts.into_iter().map(AlertResponse::from).collect(),
    }))
}

#[axum::debug_handler]
pub async fn get_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let alert = state.alert_service.get_owned(id, claims.user_id()?).await?;
    Ok(Json(AlertResponse::from(alert)))
}

#[utoipa::path(
    put,
    path = "/api/alerts/{id}",
    params(
        ("id" = Uuid, Path, description = "Alert ID")
    ),
    request_body = AlertPayload,
    responses(
        (status = 200, description = "Alert replaced", body = AlertResponse),
        (status = 400, description = "Invalid title or criteria"),
        (status = 404, description = "Alert not found")
    )
)]
#[axum::debug_handler]
pub async fn replace_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlertPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let alert = state
        .alert_service
        .replace(id, claims.user_id()?, &payload.title, &payload.criteria)
        .await?;
    Ok(Json(AlertResponse::from(alert)))
}

#[axum::debug_handler]
pub async fn pause_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let alert = state
        .alert_service
        .set_paused(id, claims.user_id()?, true)
        .await?;
    Ok(Json(AlertResponse::from(alert)))
}

#[axum::debug_handler]
pub async fn resume_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let alert = state
        .alert_service
        .set_paused(id, claims.user_id()?, false)
        .await?;
    Ok(Json(AlertResponse::from(alert)))
}

#[axum::debug_handler]
pub async fn delete_alert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.alert_service.delete(id, claims.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/alerts/{id}/matches",
    params(
        ("id" = Uuid, Path, description = "Alert ID"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("since" = Option<String>, Query, description = "Only records newer than this RFC 3339 instant")
    ),
    responses(
        (status = 200, description = "Jobs or candidate profiles matching the alert"),
        (status = 404, description = "Alert not found")
    )
)]
#[axum::debug_handler]
pub async fn alert_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<AlertMatchesQuery>,
) -> Result<Response> {
    let alert = state.alert_service.get_owned(id, claims.user_id()?).await?;
    let kind = alert
        .alert_kind()
        .ok_or_else(|| Error::Internal(format!("alert {} has unknown kind", alert.id)))?;
    let match_query = MatchQuery {
        pagination: Pagination::new(query.page, query.per_page),
        since: query.since,
    };

    let response = match kind {
        AlertKind::Job => {
            let page = state
                .matching_service
                .matching_jobs(&alert.criteria, &match_query)
                .await?;
            Json(page).into_response()
        }
        AlertKind::Candidate => {
            let page = state
                .matching_service
                .matching_candidates(&alert.criteria, &match_query)
                .await?;
            Json(page).into_response()
        }
    };
    state.alert_service.mark_matches_seen(alert.id).await?;
    Ok(response)
}
