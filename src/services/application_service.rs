use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::application_dto::ApplyPayload;
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, APPLICATION_COLUMNS};
use crate::models::invitation::{Invitation, INVITATION_COLUMNS};
use crate::models::job::{Job, JOB_COLUMNS};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::package::UsageAction;
use crate::services::notification_service::NotificationService;
use crate::services::usage_service::UsageService;
use crate::utils::pagination::{Page, Pagination};

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applying spends one application unless the employer invited the
    /// candidate to this job. A pending invitation is accepted by applying.
    pub async fn apply(
        &self,
        usage: &UsageService,
        candidate_id: Uuid,
        payload: ApplyPayload,
    ) -> Result<Application> {
        let job_sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&job_sql)
            .bind(payload.job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))?;
        if !job.is_published() {
            return Err(Error::BadRequest("This job is not accepting applications".into()));
        }
        if job.employer_id == candidate_id {
            return Err(Error::BadRequest("You cannot apply to your own job".into()));
        }

        let already_applied: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND candidate_id = $2)",
        )
        .bind(job.id)
        .bind(candidate_id)
        .fetch_one(&self.pool)
        .await?;
        if already_applied {
            return Err(Error::Conflict("You have already applied to this job".into()));
        }

        let invitation_sql = format!(
            r#"
            SELECT {} FROM invitations
            WHERE job_id = $1 AND candidate_id = $2 AND status IN ('pending', 'accepted')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            INVITATION_COLUMNS
        );
        let invitation = sqlx::query_as::<_, Invitation>(&invitation_sql)
            .bind(job.id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;
        if invitation.is_none() {
            usage.ensure_allowed(candidate_id, UsageAction::Application).await?;
        }

        let insert = format!(
            r#"
            INSERT INTO applications (job_id, candidate_id, employer_id, invitation_id, cover_letter)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let application = sqlx::query_as::<_, Application>(&insert)
            .bind(job.id)
            .bind(candidate_id)
            .bind(job.employer_id)
            .bind(invitation.as_ref().map(|i| i.id))
            .bind(payload.cover_letter.as_deref().map(str::trim))
            .fetch_one(&mut *tx)
            .await?;

        match &invitation {
            Some(invitation) if invitation.is_pending() => {
                sqlx::query(
                    "UPDATE invitations SET status = 'accepted', responded_at = NOW() WHERE id = $1 AND status = 'pending'",
                )
                .bind(invitation.id)
                .execute(&mut *tx)
                .await?;
            }
            Some(_) => {}
            None => {
                UsageService::increment_usage(&mut tx, candidate_id, UsageAction::Application)
                    .await?;
            }
        }

        NotificationService::insert(
            &mut tx,
            &NewNotification {
                user_id: job.employer_id,
                kind: NotificationKind::NewApplication,
                title: format!("New application for {}", job.title),
                body: None,
                link: Some(format!("/applications/{}", application.id)),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            job_id = %job.id,
            %candidate_id,
            invited = invitation.is_some(),
            "application submitted"
        );
        Ok(application)
    }

    /// Visible to the applicant and the job's employer only.
    pub async fn get_for_participant(&self, id: Uuid, user_id: Uuid) -> Result<Application> {
        let sql = format!(
            "SELECT {} FROM applications WHERE id = $1 AND (candidate_id = $2 OR employer_id = $2)",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".into()))
    }

    /// Moves an application forward. The update is conditional on the status
    /// read here, so two concurrent decisions cannot both succeed.
    pub async fn update_status(
        &self,
        id: Uuid,
        employer_id: Uuid,
        next: ApplicationStatus,
    ) -> Result<Application> {
        let current = self.get_for_participant(id, employer_id).await?;
        if current.employer_id != employer_id {
            return Err(Error::Forbidden(
                "Only the employer can change an application's status".into(),
            ));
        }
        let status: ApplicationStatus = current.status.parse().map_err(Error::Internal)?;
        if status.is_terminal() {
            return Err(Error::Conflict(format!(
                "Application is already {}",
                status.as_str()
            )));
        }
        if !status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move an application from {} to {}",
                status.as_str(),
                next.as_str()
            )));
        }

        let sql = format!(
            r#"
            UPDATE applications
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(next.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::Conflict("Application was updated by another request".into()))?;

        let job_title: String = sqlx::query_scalar("SELECT title FROM jobs WHERE id = $1")
            .bind(updated.job_id)
            .fetch_one(&mut *tx)
            .await?;
        NotificationService::insert(
            &mut tx,
            &NewNotification {
                user_id: updated.candidate_id,
                kind: NotificationKind::ApplicationStatus,
                title: format!("Your application for {} is now {}", job_title, next.as_str()),
                body: None,
                link: Some(format!("/applications/{}", updated.id)),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %id, from = status.as_str(), to = next.as_str(), "application status changed");
        Ok(updated)
    }

    pub async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        status: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<Application>> {
        self.list_where("candidate_id", candidate_id, None, status, pagination)
            .await
    }

    /// `job_id` narrows the listing to one of the employer's jobs.
    pub async fn list_for_employer(
        &self,
        employer_id: Uuid,
        job_id: Option<Uuid>,
        status: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<Application>> {
        self.list_where("employer_id", employer_id, job_id, status, pagination)
            .await
    }

    async fn list_where(
        &self,
        owner_column: &'static str,
        owner_id: Uuid,
        job_id: Option<Uuid>,
        status: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<Application>> {
        let filter = format!(
            "{} = $1 AND ($2::uuid IS NULL OR job_id = $2) AND ($3::text IS NULL OR status = $3)",
            owner_column
        );
        let sql = format!(
            "SELECT {} FROM applications WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            APPLICATION_COLUMNS, filter
        );
        let items = sqlx::query_as::<_, Application>(&sql)
            .bind(owner_id)
            .bind(job_id)
            .bind(status)
            .bind(pagination.per_page)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM applications WHERE {}", filter);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(owner_id)
            .bind(job_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(items, total, pagination))
    }
}
