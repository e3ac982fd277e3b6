use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ShortlistPayload {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}
