use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub audience: String,
    pub contacts_limit: Option<i32>,
    pub applications_limit: Option<i32>,
    pub jobs_limit: Option<i32>,
    pub price: Decimal,
    pub duration_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub status: String,
    pub contacts_used: i32,
    pub applications_used: i32,
    pub jobs_used: i32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An active subscription joined with the limits of its package.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionUsage {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub package_name: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub contacts_used: i32,
    pub applications_used: i32,
    pub jobs_used: i32,
    pub contacts_limit: Option<i32>,
    pub applications_limit: Option<i32>,
    pub jobs_limit: Option<i32>,
}

/// Actions bounded by a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    Contact,
    Application,
    JobPost,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::Contact => "contact",
            UsageAction::Application => "application",
            UsageAction::JobPost => "job_post",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageAction::Contact => "Contact",
            UsageAction::Application => "Application",
            UsageAction::JobPost => "Job posting",
        }
    }

    pub(crate) fn counter_column(&self) -> &'static str {
        match self {
            UsageAction::Contact => "contacts_used",
            UsageAction::Application => "applications_used",
            UsageAction::JobPost => "jobs_used",
        }
    }

    pub(crate) fn limit_column(&self) -> &'static str {
        match self {
            UsageAction::Contact => "contacts_limit",
            UsageAction::Application => "applications_limit",
            UsageAction::JobPost => "jobs_limit",
        }
    }
}

impl FromStr for UsageAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(UsageAction::Contact),
            "application" => Ok(UsageAction::Application),
            "job_post" => Ok(UsageAction::JobPost),
            other => Err(format!("unknown usage action: {}", other)),
        }
    }
}

impl SubscriptionUsage {
    pub fn used(&self, action: UsageAction) -> i32 {
        match action {
            UsageAction::Contact => self.contacts_used,
            UsageAction::Application => self.applications_used,
            UsageAction::JobPost => self.jobs_used,
        }
    }

    pub fn limit(&self, action: UsageAction) -> Option<i32> {
        match action {
            UsageAction::Contact => self.contacts_limit,
            UsageAction::Application => self.applications_limit,
            UsageAction::JobPost => self.jobs_limit,
        }
    }
}
