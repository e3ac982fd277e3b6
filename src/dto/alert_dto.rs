use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::alert::{Alert, AlertState};
use crate::models::filter_criteria::FilterCriteria;
use crate::services::alert_service::AlertOverview;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AlertPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub criteria: FilterCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub criteria: FilterCriteria,
    pub state: AlertState,
    pub is_paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_matches: Option<i64>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Alert> for AlertResponse {
    fn from(alert: Alert) -> Self {
        let state = alert.state();
        Self {
            id: alert.id,
            kind: alert.kind,
            title: alert.title,
            criteria: alert.criteria.0,
            state,
            is_paused: alert.is_paused,
            new_matches: None,
            last_notified_at: alert.last_notified_at,
            created_at: alert.created_at,
            updated_at: alert.updated_at,
        }
    }
}

impl From<AlertOverview> for AlertResponse {
    fn from(overview: AlertOverview) -> Self {
        let mut response = AlertResponse::from(overview.alert);
        response.new_matches = Some(overview.new_matches);
        response
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertListResponse {
    pub items: Vec<AlertResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertMatchesQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Only records newer than this instant.
    pub since: Option<DateTime<Utc>>,
}
