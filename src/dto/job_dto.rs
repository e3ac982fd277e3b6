use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::validation::validate_tags;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_create_salary"))]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub company: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contract_type: Option<String>,
    pub work_mode: Option<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_tags"))]
    pub skills: Vec<String>,
    /// Publish right away instead of saving a draft.
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update"))]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company: Option<String>,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contract_type: Option<String>,
    pub work_mode: Option<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub skills: Option<Vec<String>>,
}

fn check_salary_range(min: Option<Decimal>, max: Option<Decimal>) -> Result<(), ValidationError> {
    if [min, max].iter().flatten().any(|v| v.is_sign_negative()) {
        return Err(ValidationError::new("negative_salary"));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::new("salary_min_above_max"));
        }
    }
    Ok(())
}

fn validate_create_salary(payload: &CreateJobPayload) -> Result<(), ValidationError> {
    check_salary_range(payload.salary_min, payload.salary_max)
}

fn validate_update(payload: &UpdateJobPayload) -> Result<(), ValidationError> {
    if let Some(skills) = &payload.skills {
        validate_tags(skills)?;
    }
    check_salary_range(payload.salary_min, payload.salary_max)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

/// Paging for ad-hoc searches; the criteria travel in the body.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub since: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateJobPayload {
        CreateJobPayload {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            description: None,
            sector: Some("Technology".into()),
            city: None,
            country: None,
            contract_type: None,
            work_mode: None,
            experience_level: None,
            salary_min: Some(Decimal::from(80_000)),
            salary_max: Some(Decimal::from(120_000)),
            currency: Some("EUR".into()),
            skills: vec!["rust".into()],
            publish: false,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn inverted_salary_range_is_rejected() {
        let mut p = payload();
        p.salary_min = Some(Decimal::from(200_000));
        assert!(p.validate().is_err());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut p = payload();
        p.title = String::new();
        assert!(p.validate().is_err());
    }
}
