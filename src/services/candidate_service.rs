use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::candidate_dto::UpsertProfilePayload;
use crate::error::{Error, Result};
use crate::models::candidate::{CandidateProfile, CANDIDATE_COLUMNS};
use crate::utils::validation::clean_tags;

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        payload: UpsertProfilePayload,
    ) -> Result<CandidateProfile> {
        if payload
            .expected_salary
            .is_some_and(|s| s.is_sign_negative())
        {
            return Err(Error::BadRequest("expected_salary must not be negative".into()));
        }

        let sql = format!(
            r#"
            INSERT INTO candidate_profiles (
                user_id, headline, summary, sector, city, country, contract_types,
                work_modes, experience_years, education_level, expected_salary, skills, is_visible
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                headline = EXCLUDED.headline,
                summary = EXCLUDED.summary,
                sector = EXCLUDED.sector,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                contract_types = EXCLUDED.contract_types,
                work_modes = EXCLUDED.work_modes,
                experience_years = EXCLUDED.experience_years,
                education_level = EXCLUDED.education_level,
                expected_salary = EXCLUDED.expected_salary,
                skills = EXCLUDED.skills,
                is_visible = EXCLUDED.is_visible,
                updated_at = NOW()
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        let profile = sqlx::query_as::<_, CandidateProfile>(&sql)
            .bind(user_id)
            .bind(payload.headline.trim())
            .bind(payload.summary)
            .bind(payload.sector)
            .bind(payload.city)
            .bind(payload.country)
            .bind(clean_tags(payload.contract_types))
            .bind(clean_tags(payload.work_modes))
            .bind(payload.experience_years)
            .bind(payload.education_level)
            .bind(payload.expected_salary)
            .bind(clean_tags(payload.skills))
            .bind(payload.is_visible)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<CandidateProfile> {
        let sql = format!(
            "SELECT {} FROM candidate_profiles WHERE user_id = $1",
            CANDIDATE_COLUMNS
        );
        sqlx::query_as::<_, CandidateProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate profile not found".into()))
    }

    /// Hidden profiles read as missing to everyone but their owner.
    pub async fn get_visible(&self, user_id: Uuid, viewer_id: Uuid) -> Result<CandidateProfile> {
        let profile = self.get(user_id).await?;
        if profile.is_visible || profile.user_id == viewer_id {
            Ok(profile)
        } else {
            Err(Error::NotFound("Candidate profile not found".into()))
        }
    }
}
