use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::package::{Package, Subscription, SubscriptionUsage, UsageAction};

/// Outcome of a usage gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    pub action: UsageAction,
    pub allowed: bool,
    pub reason: Option<String>,
    pub used: Option<i32>,
    pub limit: Option<i32>,
    pub remaining: Option<i32>,
}

impl LimitCheck {
    fn denied(action: UsageAction, reason: String) -> Self {
        Self {
            action,
            allowed: false,
            reason: Some(reason),
            used: None,
            limit: None,
            remaining: None,
        }
    }

    pub fn into_result(self) -> Result<LimitCheck> {
        if self.allowed {
            Ok(self)
        } else {
            Err(Error::LimitExceeded(
                self.reason
                    .unwrap_or_else(|| format!("{} limit reached", self.action.label())),
            ))
        }
    }
}

/// Gate decision for `action` given the caller's active subscription.
/// A NULL limit means unlimited.
pub fn evaluate(
    usage: Option<&SubscriptionUsage>,
    action: UsageAction,
    now: DateTime<Utc>,
) -> LimitCheck {
    let Some(usage) = usage else {
        return LimitCheck::denied(
            action,
            "No active subscription. Choose a package to continue.".to_string(),
        );
    };
    if usage.expires_at <= now {
        return LimitCheck::denied(
            action,
            format!(
                "Your {} subscription expired on {}",
                usage.package_name,
                usage.expires_at.format("%Y-%m-%d")
            ),
        );
    }

    let used = usage.used(action);
    match usage.limit(action) {
        None => LimitCheck {
            action,
            allowed: true,
            reason: None,
            used: Some(used),
            limit: None,
            remaining: None,
        },
        Some(limit) if used < limit => LimitCheck {
            action,
            allowed: true,
            reason: None,
            used: Some(used),
            limit: Some(limit),
            remaining: Some(limit - used),
        },
        Some(limit) => LimitCheck {
            action,
            allowed: false,
            reason: Some(format!(
                "{} limit reached ({}/{}) on your {} package",
                action.label(),
                used,
                limit,
                usage.package_name
            )),
            used: Some(used),
            limit: Some(limit),
            remaining: Some(0),
        },
    }
}

#[derive(Clone)]
pub struct UsageService {
    pool: PgPool,
}

impl UsageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn current_usage(&self, user_id: Uuid) -> Result<Option<SubscriptionUsage>> {
        let usage = sqlx::query_as::<_, SubscriptionUsage>(
            r#"
            SELECT s.id AS subscription_id, s.user_id, p.name AS package_name, s.status, s.expires_at,
                   s.contacts_used, s.applications_used, s.jobs_used,
                   p.contacts_limit, p.applications_limit, p.jobs_limit
            FROM subscriptions s
            JOIN packages p ON p.id = s.package_id
            WHERE s.user_id = $1 AND s.status = 'active'
            ORDER BY s.expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(usage)
    }

    pub async fn check_limit(&self, user_id: Uuid, action: UsageAction) -> Result<LimitCheck> {
        let usage = self.current_usage(user_id).await?;
        Ok(evaluate(usage.as_ref(), action, Utc::now()))
    }

    /// Like `check_limit`, but a refusal becomes `Error::LimitExceeded`.
    pub async fn ensure_allowed(&self, user_id: Uuid, action: UsageAction) -> Result<LimitCheck> {
        let check = self.check_limit(user_id, action).await?;
        if !check.allowed {
            tracing::info!(%user_id, action = action.as_str(), reason = ?check.reason, "usage gate refused action");
        }
        check.into_result()
    }

    /// Consumes one unit of `action` inside the caller's transaction. The
    /// update only applies while the counter is below the package limit, so
    /// concurrent callers cannot push it past the limit.
    pub async fn increment_usage(
        conn: &mut PgConnection,
        user_id: Uuid,
        action: UsageAction,
    ) -> Result<()> {
        let counter = action.counter_column();
        let limit = action.limit_column();
        let sql = format!(
            r#"
            UPDATE subscriptions s
            SET {counter} = s.{counter} + 1, updated_at = NOW()
            FROM packages p
            WHERE p.id = s.package_id
              AND s.user_id = $1
              AND s.status = 'active'
              AND s.expires_at > NOW()
              AND (p.{limit} IS NULL OR s.{counter} < p.{limit})
            "#
        );
        let updated = sqlx::query(&sql)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(Error::LimitExceeded(format!(
                "{} limit reached",
                action.label()
            )));
        }
        Ok(())
    }

    pub async fn list_packages(&self, audience: Option<&str>) -> Result<Vec<Package>> {
        let packages = sqlx::query_as::<_, Package>(
            r#"
            SELECT id, name, audience, contacts_limit, applications_limit, jobs_limit, price, duration_days, is_active, created_at
            FROM packages
            WHERE is_active = TRUE AND ($1::text IS NULL OR audience = $1)
            ORDER BY price ASC, name ASC
            "#,
        )
        .bind(audience)
        .fetch_all(&self.pool)
        .await?;
        Ok(packages)
    }

    /// Activates `package_id` for the user, cancelling any active
    /// subscription. Counters start from zero.
    pub async fn assign_package(&self, user_id: Uuid, package_id: Uuid) -> Result<Subscription> {
        let package = sqlx::query_as::<_, Package>(
            r#"
            SELECT id, name, audience, contacts_limit, applications_limit, jobs_limit, price, duration_days, is_active, created_at
            FROM packages WHERE id = $1
            "#,
        )
        .bind(package_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Package not found".into()))?;
        if !package.is_active {
            return Err(Error::BadRequest("Package is no longer offered".into()));
        }

        let now = Utc::now();
        let expires_at = now + Duration::days(package.duration_days as i64);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE subscriptions SET status = 'cancelled', updated_at = NOW() WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, package_id, status, starts_at, expires_at)
            VALUES ($1, $2, 'active', $3, $4)
            RETURNING id, user_id, package_id, status, contacts_used, applications_used, jobs_used, starts_at, expires_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(package.id)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(%user_id, package = %package.name, "package assigned");
        Ok(subscription)
    }

    pub async fn expire_overdue(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = 'expired', updated_at = NOW() WHERE status = 'active' AND expires_at <= NOW()",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
