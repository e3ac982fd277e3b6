use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertProfilePayload {
    #[validate(length(min = 1, max = 200))]
    pub headline: String,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    pub sector: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_tags"))]
    pub contract_types: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_tags"))]
    pub work_modes: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 80))]
    pub experience_years: i32,
    pub education_level: Option<String>,
    pub expected_salary: Option<Decimal>,
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_tags"))]
    pub skills: Vec<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}
