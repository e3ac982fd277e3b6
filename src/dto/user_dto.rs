use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile details the identity provider does not carry in the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncUserPayload {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
}
