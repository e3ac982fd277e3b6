use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::filter_criteria::FilterCriteria;
use crate::models::user::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: String,
    pub title: String,
    pub criteria: Json<FilterCriteria>,
    pub is_paused: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ALERT_COLUMNS: &str =
    "id, owner_id, kind, title, criteria, is_paused, last_notified_at, created_at, updated_at";

/// What an alert searches for: jobs (owned by candidates) or candidates
/// (owned by employers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Job,
    Candidate,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Job => "job",
            AlertKind::Candidate => "candidate",
        }
    }

    pub fn for_role(role: UserRole) -> Option<AlertKind> {
        match role {
            UserRole::Candidate => Some(AlertKind::Job),
            UserRole::Employer => Some(AlertKind::Candidate),
            UserRole::Admin => None,
        }
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(AlertKind::Job),
            "candidate" => Ok(AlertKind::Candidate),
            other => Err(format!("unknown alert kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Active,
    Paused,
}

impl Alert {
    pub fn state(&self) -> AlertState {
        if self.is_paused {
            AlertState::Paused
        } else {
            AlertState::Active
        }
    }

    pub fn alert_kind(&self) -> Option<AlertKind> {
        self.kind.parse().ok()
    }
}
