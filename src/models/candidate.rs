use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub user_id: Uuid,
    pub headline: String,
    pub summary: Option<String>,
    pub sector: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contract_types: Vec<String>,
    pub work_modes: Vec<String>,
    pub experience_years: i32,
    pub education_level: Option<String>,
    pub expected_salary: Option<Decimal>,
    pub skills: Vec<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CANDIDATE_COLUMNS: &str = "user_id, headline, summary, sector, city, country, contract_types, work_modes, experience_years, education_level, expected_salary, skills, is_visible, created_at, updated_at";
