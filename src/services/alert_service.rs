use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::alert::{Alert, AlertKind, ALERT_COLUMNS};
use crate::models::candidate::CandidateProfile;
use crate::models::filter_criteria::FilterCriteria;
use crate::models::job::Job;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::services::notification_service::NotificationService;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub alert: Alert,
    pub new_matches: i64,
}

#[derive(Clone)]
pub struct AlertService {
    pool: PgPool,
}

impl AlertService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        kind: AlertKind,
        title: &str,
        criteria: &FilterCriteria,
    ) -> Result<Alert> {
        criteria.validate_for(kind)?;
        let sql = format!(
            "INSERT INTO alerts (owner_id, kind, title, criteria) VALUES ($1, $2, $3, $4) RETURNING {}",
            ALERT_COLUMNS
        );
        let alert = sqlx::query_as::<_, Alert>(&sql)
            .bind(owner_id)
            .bind(kind.as_str())
            .bind(title.trim())
            .bind(Json(criteria.normalized()))
            .fetch_one(&self.pool)
            .await?;
        tracing::info!(
            alert_id = %alert.id,
            %owner_id,
            kind = kind.as_str(),
            unconstrained = criteria.is_empty(),
            "alert created"
        );
        Ok(alert)
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<AlertOverview>> {
        let alerts = sqlx::query_as::<_, AlertOverview>(
            r#"
            SELECT a.id, a.owner_id, a.kind, a.title, a.criteria, a.is_paused, a.last_notified_at, a.created_at, a.updated_at,
                   (SELECT COUNT(*) FROM alert_matches m WHERE m.alert_id = a.id AND m.seen_at IS NULL) AS new_matches
            FROM alerts a
            WHERE a.owner_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(alerts)
    }

    /// Alerts are private: someone else's alert reads as missing.
    pub async fn get_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Alert> {
        let sql = format!(
            "SELECT {} FROM alerts WHERE id = $1 AND owner_id = $2",
            ALERT_COLUMNS
        );
        sqlx::query_as::<_, Alert>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Alert not found".into()))
    }

    /// Replaces title and criteria wholesale.
    pub async fn replace(
        &self,
        id: Uuid,
        owner_id: Uuid,
        title: &str,
        criteria: &FilterCriteria,
    ) -> Result<Alert> {
        let existing = self.get_owned(id, owner_id).await?;
        let kind = existing
            .alert_kind()
            .ok_or_else(|| Error::Internal(format!("alert {} has unknown kind", id)))?;
        criteria.validate_for(kind)?;

        let sql = format!(
            "UPDATE alerts SET title = $3, criteria = $4, updated_at = NOW() WHERE id = $1 AND owner_id = $2 RETURNING {}",
            ALERT_COLUMNS
        );
        let alert = sqlx::query_as::<_, Alert>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(title.trim())
            .bind(Json(criteria.normalized()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Alert not found".into()))?;
        Ok(alert)
    }

    /// Toggles only the paused flag; no other column changes.
    pub async fn set_paused(&self, id: Uuid, owner_id: Uuid, paused: bool) -> Result<Alert> {
        let sql = format!(
            "UPDATE alerts SET is_paused = $3 WHERE id = $1 AND owner_id = $2 RETURNING {}",
            ALERT_COLUMNS
        );
        sqlx::query_as::<_, Alert>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(paused)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Alert not found".into()))
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Alert not found".into()));
        }
        Ok(())
    }

    pub async fn mark_matches_seen(&self, alert_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE alert_matches SET seen_at = NOW() WHERE alert_id = $1 AND seen_at IS NULL",
        )
        .bind(alert_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Evaluates a newly published job against every active job alert and
    /// notifies owners the first time the job matches their alert.
    pub async fn notify_job_alerts(&self, job: &Job) -> Result<usize> {
        let alerts = self.active_alerts(AlertKind::Job, job.employer_id).await?;
        let mut notified = 0;
        for alert in alerts.iter().filter(|a| a.criteria.0.matches_job(job)) {
            let notification = NewNotification {
                user_id: alert.owner_id,
                kind: NotificationKind::AlertMatch,
                title: format!("New job for \"{}\"", alert.title),
                body: Some(format!("{} at {}", job.title, job.company)),
                link: Some(format!("/jobs/{}", job.id)),
            };
            if self.record_match(alert, job.id, notification).await? {
                notified += 1;
            }
        }
        if notified > 0 {
            tracing::info!(job_id = %job.id, notified, "job alerts notified");
        }
        Ok(notified)
    }

    /// Same as `notify_job_alerts` for a visible candidate profile.
    pub async fn notify_candidate_alerts(&self, profile: &CandidateProfile) -> Result<usize> {
        let alerts = self
            .active_alerts(AlertKind::Candidate, profile.user_id)
            .await?;
        let mut notified = 0;
        for alert in alerts
            .iter()
            .filter(|a| a.criteria.0.matches_candidate(profile))
        {
            let notification = NewNotification {
                user_id: alert.owner_id,
                kind: NotificationKind::AlertMatch,
                title: format!("New candidate for \"{}\"", alert.title),
                body: Some(profile.headline.clone()),
                link: Some(format!("/candidates/{}", profile.user_id)),
            };
            if self.record_match(alert, profile.user_id, notification).await? {
                notified += 1;
            }
        }
        if notified > 0 {
            tracing::info!(candidate_id = %profile.user_id, notified, "candidate alerts notified");
        }
        Ok(notified)
    }

    async fn active_alerts(&self, kind: AlertKind, record_owner: Uuid) -> Result<Vec<Alert>> {
        let sql = format!(
            "SELECT {} FROM alerts WHERE kind = $1 AND is_paused = FALSE AND owner_id <> $2",
            ALERT_COLUMNS
        );
        let alerts = sqlx::query_as::<_, Alert>(&sql)
            .bind(kind.as_str())
            .bind(record_owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(alerts)
    }

    /// Returns false when the record had already matched this alert.
    async fn record_match(
        &self,
        alert: &Alert,
        record_id: Uuid,
        notification: NewNotification,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO alert_matches (alert_id, record_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(alert.id)
        .bind(record_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        NotificationService::insert(&mut tx, &notification).await?;
        sqlx::query("UPDATE alerts SET last_notified_at = NOW() WHERE id = $1")
            .bind(alert.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}
