use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortlistEntry {
    pub employer_id: Uuid,
    pub candidate_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
