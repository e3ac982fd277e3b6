use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::job_dto::{CreateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus, JOB_COLUMNS};
use crate::models::package::UsageAction;
use crate::services::usage_service::UsageService;
use crate::utils::pagination::{Page, Pagination};
use crate::utils::validation::clean_tags;

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creating a job spends one job post from the employer's package.
    pub async fn create(
        &self,
        usage: &UsageService,
        employer_id: Uuid,
        payload: CreateJobPayload,
    ) -> Result<Job> {
        usage.ensure_allowed(employer_id, UsageAction::JobPost).await?;

        let status = if payload.publish {
            JobStatus::Published
        } else {
            JobStatus::Draft
        };
        let sql = format!(
            r#"
            INSERT INTO jobs (
                employer_id, title, company, description, sector, city, country,
                contract_type, work_mode, experience_level, salary_min, salary_max,
                currency, skills, status, published_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11, $12,
                $13, $14, $15, CASE WHEN $15 = 'published' THEN NOW() END
            )
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        UsageService::increment_usage(&mut tx, employer_id, UsageAction::JobPost).await?;
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(employer_id)
            .bind(payload.title.trim())
            .bind(payload.company.trim())
            .bind(payload.description)
            .bind(payload.sector)
            .bind(payload.city)
            .bind(payload.country)
            .bind(payload.contract_type)
            .bind(payload.work_mode)
            .bind(payload.experience_level)
            .bind(payload.salary_min)
            .bind(payload.salary_max)
            .bind(payload.currency)
            .bind(clean_tags(payload.skills))
            .bind(status.as_str())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(job_id = %job.id, %employer_id, status = %job.status, "job created");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    /// Published jobs are visible to everyone; drafts and closed jobs only
    /// to their employer.
    pub async fn get_visible_to(&self, id: Uuid, viewer_id: Uuid) -> Result<Job> {
        let job = self.get(id).await?;
        if job.is_published() || job.employer_id == viewer_id {
            Ok(job)
        } else {
            Err(Error::NotFound("Job not found".into()))
        }
    }

    pub async fn get_owned(&self, id: Uuid, employer_id: Uuid) -> Result<Job> {
        let job = self.get(id).await?;
        if job.employer_id != employer_id {
            return Err(Error::Forbidden("You do not own this job".into()));
        }
        Ok(job)
    }

    /// Unset fields keep their current value.
    pub async fn update(&self, id: Uuid, employer_id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let current = self.get_owned(id, employer_id).await?;
        if current.status == JobStatus::Closed.as_str() {
            return Err(Error::Conflict("Closed jobs cannot be edited".into()));
        }
        let salary_min = payload.salary_min.or(current.salary_min);
        let salary_max = payload.salary_max.or(current.salary_max);
        if let (Some(min), Some(max)) = (salary_min, salary_max) {
            if min > max {
                return Err(Error::BadRequest("salary_min must not exceed salary_max".into()));
            }
        }

        let sql = format!(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                company = COALESCE($3, company),
                description = COALESCE($4, description),
                sector = COALESCE($5, sector),
                city = COALESCE($6, city),
                country = COALESCE($7, country),
                contract_type = COALESCE($8, contract_type),
                work_mode = COALESCE($9, work_mode),
                experience_level = COALESCE($10, experience_level),
                salary_min = COALESCE($11, salary_min),
                salary_max = COALESCE($12, salary_max),
                currency = COALESCE($13, currency),
                skills = COALESCE($14, skills),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(payload.title.map(|t| t.trim().to_string()))
            .bind(payload.company.map(|c| c.trim().to_string()))
            .bind(payload.description)
            .bind(payload.sector)
            .bind(payload.city)
            .bind(payload.country)
            .bind(payload.contract_type)
            .bind(payload.work_mode)
            .bind(payload.experience_level)
            .bind(payload.salary_min)
            .bind(payload.salary_max)
            .bind(payload.currency)
            .bind(payload.skills.map(clean_tags))
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }

    /// Draft to published. Returns the job and whether this call published it.
    pub async fn publish(&self, id: Uuid, employer_id: Uuid) -> Result<(Job, bool)> {
        let current = self.get_owned(id, employer_id).await?;
        if current.is_published() {
            return Ok((current, false));
        }
        if current.status == JobStatus::Closed.as_str() {
            return Err(Error::Conflict("Closed jobs cannot be republished".into()));
        }

        let sql = format!(
            r#"
            UPDATE jobs
            SET status = 'published', published_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        match sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(job) => {
                tracing::info!(job_id = %job.id, "job published");
                Ok((job, true))
            }
            None => Ok((self.get(id).await?, false)),
        }
    }

    pub async fn close(&self, id: Uuid, employer_id: Uuid) -> Result<Job> {
        self.get_owned(id, employer_id).await?;
        let sql = format!(
            "UPDATE jobs SET status = 'closed', updated_at = NOW() WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }

    pub async fn list_for_employer(
        &self,
        employer_id: Uuid,
        status: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<Job>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM jobs
            WHERE employer_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            JOB_COLUMNS
        );
        let items = sqlx::query_as::<_, Job>(&sql)
            .bind(employer_id)
            .bind(status)
            .bind(pagination.per_page)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE employer_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(employer_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(Page::new(items, total, pagination))
    }
}
