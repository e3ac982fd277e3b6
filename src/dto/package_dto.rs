use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::package::{SubscriptionUsage, UsageAction};
use crate::services::usage_service::LimitCheck;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PackageListQuery {
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignPackagePayload {
    pub user_id: Uuid,
    pub package_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCheckQuery {
    pub action: UsageAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageResponse {
    pub subscription: Option<SubscriptionUsage>,
    pub checks: Vec<LimitCheck>,
}
