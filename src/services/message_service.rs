use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::{Conversation, ConversationSummary, Message};
use crate::models::package::UsageAction;
use crate::models::user::UserRole;
use crate::services::usage_service::UsageService;

const CONVERSATION_COLUMNS: &str = "id, participant_low, participant_high, created_at, last_message_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, body, read_at, created_at";

pub struct StartedConversation {
    pub conversation: Conversation,
    pub message: Message,
    pub created: bool,
}

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_between(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>> {
        let (low, high) = Conversation::ordered_pair(a, b);
        let sql = format!(
            "SELECT {} FROM conversations WHERE participant_low = $1 AND participant_high = $2",
            CONVERSATION_COLUMNS
        );
        let conversation = sqlx::query_as::<_, Conversation>(&sql)
            .bind(low)
            .bind(high)
            .fetch_optional(&self.pool)
            .await?;
        Ok(conversation)
    }

    /// Non-participants get a 404.
    pub async fn get_for_participant(&self, id: Uuid, user_id: Uuid) -> Result<Conversation> {
        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let conversation = sqlx::query_as::<_, Conversation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .filter(|c| c.has_participant(user_id))
            .ok_or_else(|| Error::NotFound("Conversation not found".into()))?;
        Ok(conversation)
    }

    /// Sends `body` to `recipient_id`, opening the conversation on first
    /// contact. An employer opening a conversation with a candidate spends a
    /// contact; candidates may only open one with an employer they applied to.
    pub async fn start_conversation(
        &self,
        usage: &UsageService,
        sender_id: Uuid,
        sender_role: UserRole,
        recipient_id: Uuid,
        body: &str,
    ) -> Result<StartedConversation> {
        if sender_id == recipient_id {
            return Err(Error::BadRequest("Cannot start a conversation with yourself".into()));
        }

        if let Some(conversation) = self.find_between(sender_id, recipient_id).await? {
            let message = self.send(&conversation, sender_id, body).await?;
            return Ok(StartedConversation {
                conversation,
                message,
                created: false,
            });
        }

        let recipient_role: String = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(recipient_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Recipient not found".into()))?;
        let recipient_role: UserRole = recipient_role
            .parse()
            .map_err(Error::Internal)?;

        let gated = match (sender_role, recipient_role) {
            (UserRole::Admin, _) | (_, UserRole::Admin) => false,
            (UserRole::Employer, UserRole::Candidate) => {
                usage.ensure_allowed(sender_id, UsageAction::Contact).await?;
                true
            }
            (UserRole::Candidate, UserRole::Employer) => {
                let applied: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM applications WHERE candidate_id = $1 AND employer_id = $2)",
                )
                .bind(sender_id)
                .bind(recipient_id)
                .fetch_one(&self.pool)
                .await?;
                if !applied {
                    return Err(Error::Forbidden(
                        "Apply to one of this employer's jobs before messaging them".into(),
                    ));
                }
                false
            }
            _ => {
                return Err(Error::Forbidden(
                    "Conversations are between candidates and employers".into(),
                ))
            }
        };

        let mut tx = self.pool.begin().await?;
        let (conversation, created) = open_conversation(&mut tx, sender_id, recipient_id).await?;
        if created && gated {
            UsageService::increment_usage(&mut tx, sender_id, UsageAction::Contact).await?;
        }
        let message = insert_message(&mut tx, conversation.id, sender_id, body).await?;
        tx.commit().await?;

        if created {
            tracing::info!(conversation_id = %conversation.id, %sender_id, %recipient_id, "conversation opened");
        }
        Ok(StartedConversation {
            conversation,
            message,
            created,
        })
    }

    pub async fn send(&self, conversation: &Conversation, sender_id: Uuid, body: &str) -> Result<Message> {
        if !conversation.has_participant(sender_id) {
            return Err(Error::NotFound("Conversation not found".into()));
        }
        let mut tx = self.pool.begin().await?;
        let message = insert_message(&mut tx, conversation.id, sender_id, body).await?;
        tx.commit().await?;
        tracing::debug!(
            conversation_id = %conversation.id,
            recipient_id = %conversation.other_participant(sender_id),
            "message sent"
        );
        Ok(message)
    }

    /// Oldest first. Without `after` this is the latest `limit` messages.
    /// With `after` it is the next `limit` messages past the cursor, so a
    /// polling client that advances its cursor never skips any.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let limit = limit.clamp(1, 500);
        let messages = match after {
            Some(after) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM messages
                    WHERE conversation_id = $1 AND created_at > $2
                    ORDER BY created_at ASC, id ASC
                    LIMIT $3
                    "#,
                    MESSAGE_COLUMNS
                );
                sqlx::query_as::<_, Message>(&sql)
                    .bind(conversation_id)
                    .bind(after)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {} FROM (
                        SELECT {} FROM messages
                        WHERE conversation_id = $1
                        ORDER BY created_at DESC
                        LIMIT $2
                    ) recent
                    ORDER BY created_at ASC
                    "#,
                    MESSAGE_COLUMNS, MESSAGE_COLUMNS
                );
                sqlx::query_as::<_, Message>(&sql)
                    .bind(conversation_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(messages)
    }

    /// Marks the other participant's messages as read.
    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let conversations = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id,
                   u.id AS other_participant_id,
                   u.full_name AS other_participant_name,
                   lm.body AS last_message,
                   c.last_message_at,
                   (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND m.read_at IS NULL) AS unread_count
            FROM conversations c
            JOIN users u
              ON u.id = CASE WHEN c.participant_low = $1 THEN c.participant_high ELSE c.participant_low END
            LEFT JOIN LATERAL (
                SELECT body FROM messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.created_at DESC
                LIMIT 1
            ) lm ON TRUE
            WHERE c.participant_low = $1 OR c.participant_high = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(conversations)
    }
}

/// Returns the conversation for the pair and whether this call created it.
async fn open_conversation(
    conn: &mut PgConnection,
    a: Uuid,
    b: Uuid,
) -> Result<(Conversation, bool)> {
    let (low, high) = Conversation::ordered_pair(a, b);
    let insert = format!(
        r#"
        INSERT INTO conversations (participant_low, participant_high)
        VALUES ($1, $2)
        ON CONFLICT (participant_low, participant_high) DO NOTHING
        RETURNING {}
        "#,
        CONVERSATION_COLUMNS
    );
    let created = sqlx::query_as::<_, Conversation>(&insert)
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(conversation) = created {
        return Ok((conversation, true));
    }

    let select = format!(
        "SELECT {} FROM conversations WHERE participant_low = $1 AND participant_high = $2",
        CONVERSATION_COLUMNS
    );
    let existing = sqlx::query_as::<_, Conversation>(&select)
        .bind(low)
        .bind(high)
        .fetch_one(&mut *conn)
        .await?;
    Ok((existing, false))
}

async fn insert_message(
    conn: &mut PgConnection,
    conversation_id: Uuid,
    sender_id: Uuid,
    body: &str,
) -> Result<Message> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::BadRequest("Message body must not be empty".into()));
    }
    let sql = format!(
        "INSERT INTO messages (conversation_id, sender_id, body) VALUES ($1, $2, $3) RETURNING {}",
        MESSAGE_COLUMNS
    );
    let message = sqlx::query_as::<_, Message>(&sql)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&mut *conn)
        .await?;
    sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(message.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(message)
}
