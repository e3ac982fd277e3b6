use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::invitation_dto::CreateInvitationPayload;
use crate::error::{Error, Result};
use crate::models::invitation::{Invitation, InvitationStatus, INVITATION_COLUMNS};
use crate::models::job::{Job, JOB_COLUMNS};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::package::UsageAction;
use crate::services::notification_service::NotificationService;
use crate::services::usage_service::UsageService;
use crate::utils::pagination::{Page, Pagination};

#[derive(Clone)]
pub struct InvitationService {
    pool: PgPool,
}

impl InvitationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Invites a visible candidate to one of the employer's published jobs.
    /// Each invitation spends one contact.
    pub async fn invite(
        &self,
        usage: &UsageService,
        employer_id: Uuid,
        payload: CreateInvitationPayload,
    ) -> Result<Invitation> {
        let job_sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&job_sql)
            .bind(payload.job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))?;
        if job.employer_id != employer_id {
            return Err(Error::Forbidden("You do not own this job".into()));
        }
        if !job.is_published() {
            return Err(Error::BadRequest("Only published jobs accept invitations".into()));
        }

        let visible: Option<bool> =
            sqlx::query_scalar("SELECT is_visible FROM candidate_profiles WHERE user_id = $1")
                .bind(payload.candidate_id)
                .fetch_optional(&self.pool)
                .await?;
        if visible != Some(true) {
            return Err(Error::NotFound("Candidate not found".into()));
        }

        let already_applied: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND candidate_id = $2)",
        )
        .bind(job.id)
        .bind(payload.candidate_id)
        .fetch_one(&self.pool)
        .await?;
        if already_applied {
            return Err(Error::Conflict("Candidate has already applied to this job".into()));
        }

        usage.ensure_allowed(employer_id, UsageAction::Contact).await?;

        let sql = format!(
            r#"
            INSERT INTO invitations (employer_id, job_id, candidate_id, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let invitation = sqlx::query_as::<_, Invitation>(&sql)
            .bind(employer_id)
            .bind(job.id)
            .bind(payload.candidate_id)
            .bind(payload.message.as_deref().map(str::trim))
            .fetch_one(&mut *tx)
            .await?;
        UsageService::increment_usage(&mut tx, employer_id, UsageAction::Contact).await?;
        NotificationService::insert(
            &mut tx,
            &NewNotification {
                user_id: payload.candidate_id,
                kind: NotificationKind::Invitation,
                title: format!("{} invited you to apply for {}", job.company, job.title),
                body: invitation.message.clone(),
                link: Some(format!("/invitations/{}", invitation.id)),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(invitation_id = %invitation.id, job_id = %job.id, candidate_id = %payload.candidate_id, "invitation sent");
        Ok(invitation)
    }

    /// Accepts or declines a pending invitation. Only the first response
    /// counts; later ones get a conflict.
    pub async fn respond(&self, id: Uuid, candidate_id: Uuid, accept: bool) -> Result<Invitation> {
        let next = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };

        let sql = format!(
            r#"
            UPDATE invitations
            SET status = $3, responded_at = NOW()
            WHERE id = $1 AND candidate_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let Some(invitation) = sqlx::query_as::<_, Invitation>(&sql)
            .bind(id)
            .bind(candidate_id)
            .bind(next.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM invitations WHERE id = $1 AND candidate_id = $2)",
            )
            .bind(id)
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await?;
            return Err(if exists {
                Error::Conflict("Invitation has already been answered".into())
            } else {
                Error::NotFound("Invitation not found".into())
            });
        };

        NotificationService::insert(
            &mut tx,
            &NewNotification {
                user_id: invitation.employer_id,
                kind: NotificationKind::InvitationResponse,
                title: format!("A candidate {} your invitation", next.as_str()),
                body: None,
                link: Some(format!("/invitations/{}", invitation.id)),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(invitation_id = %id, status = next.as_str(), "invitation answered");
        Ok(invitation)
    }

    pub async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Invitation>> {
        self.list_where("candidate_id", candidate_id, pagination).await
    }

    pub async fn list_for_employer(
        &self,
        employer_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Invitation>> {
        self.list_where("employer_id", employer_id, pagination).await
    }

    async fn list_where(
        &self,
        owner_column: &'static str,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Invitation>> {
        let sql = format!(
            "SELECT {} FROM invitations WHERE {} = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            INVITATION_COLUMNS, owner_column
        );
        let items = sqlx::query_as::<_, Invitation>(&sql)
            .bind(owner_id)
            .bind(pagination.per_page)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        let count_sql = format!("SELECT COUNT(*) FROM invitations WHERE {} = $1", owner_column);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(items, total, pagination))
    }
}
