use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{User, UserRole};

const USER_COLUMNS: &str = "id, email, full_name, role, created_at, updated_at";

/// Local mirror of identity-provider accounts, needed for foreign keys and
/// display names.
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn sync(
        &self,
        id: Uuid,
        email: &str,
        full_name: &str,
        role: UserRole,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::BadRequest("Token carries no email address".into()));
        }
        let sql = format!(
            r#"
            INSERT INTO users (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&email)
            .bind(full_name.trim())
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        tracing::debug!(user_id = %user.id, role = %user.role, "user synced");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".into()))
    }
}
