use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::notification_service::InboxCounts;

pub const DEFAULT_MESSAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartConversationPayload {
    pub recipient_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MessageListQuery {
    pub after: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationListQuery {
    pub unread_only: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxPollResponse {
    #[serde(flatten)]
    pub counts: InboxCounts,
    pub chat_poll_interval_secs: u64,
    pub notification_poll_interval_secs: u64,
}
