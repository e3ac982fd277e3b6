use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::message_dto::{
        MessageListQuery, SendMessagePayload, StartConversationPayload, DEFAULT_MESSAGE_LIMIT,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let items = state
        .message_service
        .list_conversations(claims.user_id()?)
        .await?;
    Ok(Json(json!({ "items": items })))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    request_body = StartConversationPayload,
    responses(
        (status = 201, description = "Conversation opened with a first message"),
        (status = 200, description = "Message added to the existing conversation"),
        (status = 402, description = "Contact limit reached"),
        (status = 403, description = "Candidate has not applied to this employer")
    )
)]
#[axum::debug_handler]
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartConversationPayload>,
) -> Result<impl IntoResponse> {
    let sender_id = claims.user_id()?;
    let sender_role = claims.role()?;
    payload.validate()?;
    let started = state
        .message_service
        .start_conversation(
            &state.usage_service,
            sender_id,
            sender_role,
            payload.recipient_id,
            &payload.body,
        )
        .await?;
    let status = if started.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(json!({
            "conversation": started.conversation,
            "message": started.message,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID"),
        ("after" = Option<String>, Query, description = "Only messages created after this instant"),
        ("limit" = Option<i64>, Query, description = "Maximum number of messages")
    ),
    responses(
        (status = 200, description = "Messages, oldest first"),
        (status = 404, description = "Conversation not found")
    )
)]
#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<MessageListQuery>,
) -> Result<impl IntoResponse> {
    let conversation = state
        .message_service
        .get_for_participant(id, claims.user_id()?)
        .await?;
    let items = state
        .message_service
        .list_messages(
            conversation.id,
            query.after,
            query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT),
        )
        .await?;
    Ok(Json(json!({ "items": items })))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Message sent", body = crate::models::message::Message),
        (status = 404, description = "Conversation not found")
    )
)]
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    let sender_id = claims.user_id()?;
    payload.validate()?;
    let conversation = state
        .message_service
        .get_for_participant(id, sender_id)
        .await?;
    let message = state
        .message_service
        .send(&conversation, sender_id, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let reader_id = claims.user_id()?;
    let conversation = state
        .message_service
        .get_for_participant(id, reader_id)
        .await?;
    let updated = state
        .message_service
        .mark_read(conversation.id, reader_id)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}
