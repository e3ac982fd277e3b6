use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::get_config,
    dto::message_dto::{InboxPollResponse, NotificationListQuery},
    error::Result,
    middleware::auth::Claims,
    utils::pagination::Pagination,
    AppState,
};

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .notification_service
        .list(
            claims.user_id()?,
            query.unread_only,
            Pagination::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state
        .notification_service
        .mark_read(id, claims.user_id()?)
        .await?;
    Ok(Json(notification))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let updated = state
        .notification_service
        .mark_all_read(claims.user_id()?)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

#[utoipa::path(
    get,
    path = "/api/inbox/poll",
    responses(
        (status = 200, description = "Unread counters and the poll intervals clients should use", body = InboxPollResponse)
    )
)]
#[axum::debug_handler]
pub async fn poll_inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let counts = state
        .notification_service
        .inbox_counts(claims.user_id()?)
        .await?;
    let config = get_config();
    Ok(Json(InboxPollResponse {
        counts,
        chat_poll_interval_secs: config.chat_poll_interval_secs,
        notification_poll_interval_secs: config.notification_poll_interval_secs,
    }))
}
