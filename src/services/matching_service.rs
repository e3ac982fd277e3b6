use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::Result;
use crate::models::candidate::{CandidateProfile, CANDIDATE_COLUMNS};
use crate::models::filter_criteria::FilterCriteria;
use crate::models::job::{Job, JOB_COLUMNS};
use crate::utils::pagination::{Page, Pagination};

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchQuery {
    pub pagination: Pagination,
    /// Only records published (jobs) or updated (profiles) after this instant.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct MatchingService {
    pool: PgPool,
}

impl MatchingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn matching_jobs(
        &self,
        criteria: &FilterCriteria,
        query: &MatchQuery,
    ) -> Result<Page<Job>> {
        let criteria = criteria.normalized();
        let pagination = query.pagination;

        let mut items_qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM jobs", JOB_COLUMNS));
        push_job_filters(&mut items_qb, &criteria, query.since);
        items_qb
            .push(" ORDER BY published_at DESC NULLS LAST, created_at DESC LIMIT ")
            .push_bind(pagination.per_page)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = items_qb
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_job_filters(&mut count_qb, &criteria, query.since);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn matching_candidates(
        &self,
        criteria: &FilterCriteria,
        query: &MatchQuery,
    ) -> Result<Page<CandidateProfile>> {
        let criteria = criteria.normalized();
        let pagination = query.pagination;

        let mut items_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM candidate_profiles",
            CANDIDATE_COLUMNS
        ));
        push_candidate_filters(&mut items_qb, &criteria, query.since);
        items_qb
            .push(" ORDER BY updated_at DESC LIMIT ")
            .push_bind(pagination.per_page)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = items_qb
            .build_query_as::<CandidateProfile>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidate_profiles");
        push_candidate_filters(&mut count_qb, &criteria, query.since);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }
}

/// Appends the WHERE clause for published jobs satisfying `criteria`.
/// `criteria` must already be normalized.
pub fn push_job_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    criteria: &FilterCriteria,
    since: Option<DateTime<Utc>>,
) {
    qb.push(" WHERE status = 'published'");

    if let Some(keywords) = &criteria.keywords {
        let pattern = like_pattern(keywords);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    push_any_of(qb, "sector", &criteria.sectors);
    push_any_of(qb, "city", &criteria.cities);
    push_any_of(qb, "contract_type", &criteria.contract_types);
    push_any_of(qb, "work_mode", &criteria.work_modes);
    push_any_of(qb, "experience_level", &criteria.experience_levels);
    push_overlaps(qb, "skills", &criteria.skills);

    if let Some(min) = criteria.salary_min {
        qb.push(" AND COALESCE(salary_max, salary_min) >= ")
            .push_bind(min);
    }
    if let Some(max) = criteria.salary_max {
        qb.push(" AND COALESCE(salary_min, salary_max) <= ")
            .push_bind(max);
    }
    if let Some(since) = since {
        qb.push(" AND COALESCE(published_at, created_at) > ")
            .push_bind(since);
    }
}

/// Appends the WHERE clause for visible profiles satisfying `criteria`.
/// `criteria` must already be normalized.
pub fn push_candidate_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    criteria: &FilterCriteria,
    since: Option<DateTime<Utc>>,
) {
    qb.push(" WHERE is_visible = TRUE");

    if let Some(keywords) = &criteria.keywords {
        let pattern = like_pattern(keywords);
        qb.push(" AND (headline ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR summary ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    push_any_of(qb, "sector", &criteria.sectors);
    push_any_of(qb, "city", &criteria.cities);
    push_any_of(qb, "education_level", &criteria.education_levels);
    push_overlaps(qb, "contract_types", &criteria.contract_types);
    push_overlaps(qb, "work_modes", &criteria.work_modes);
    push_overlaps(qb, "skills", &criteria.skills);

    if let Some(min) = criteria.experience_years_min {
        qb.push(" AND experience_years >= ").push_bind(min);
    }
    if let Some(max) = criteria.experience_years_max {
        qb.push(" AND experience_years <= ").push_bind(max);
    }
    if let Some(min) = criteria.salary_min {
        qb.push(" AND expected_salary >= ").push_bind(min);
    }
    if let Some(max) = criteria.salary_max {
        qb.push(" AND expected_salary <= ").push_bind(max);
    }
    if let Some(since) = since {
        qb.push(" AND updated_at > ").push_bind(since);
    }
}

fn push_any_of(qb: &mut QueryBuilder<'_, Postgres>, column: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    qb.push(format!(" AND LOWER({}) = ANY(", column))
        .push_bind(values.to_vec())
        .push(")");
}

fn push_overlaps(qb: &mut QueryBuilder<'_, Postgres>, column: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    qb.push(format!(
        " AND EXISTS (SELECT 1 FROM unnest({}) AS v(item) WHERE LOWER(v.item) = ANY(",
        column
    ))
    .push_bind(values.to_vec())
    .push("))");
}

fn like_pattern(keywords: &str) -> String {
    let escaped = keywords
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
