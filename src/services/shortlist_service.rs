use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::shortlist::ShortlistEntry;

#[derive(Clone)]
pub struct ShortlistService {
    pool: PgPool,
}

impl ShortlistService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds the candidate, or replaces the note when already shortlisted.
    pub async fn save(
        &self,
        employer_id: Uuid,
        candidate_id: Uuid,
        note: Option<&str>,
    ) -> Result<ShortlistEntry> {
        let entry = sqlx::query_as::<_, ShortlistEntry>(
            r#"
            INSERT INTO shortlist_entries (employer_id, candidate_id, note)
            SELECT $1, user_id, $3 FROM candidate_profiles WHERE user_id = $2 AND is_visible = TRUE
            ON CONFLICT (employer_id, candidate_id) DO UPDATE SET note = EXCLUDED.note
            RETURNING employer_id, candidate_id, note, created_at
            "#,
        )
        .bind(employer_id)
        .bind(candidate_id)
        .bind(note.map(str::trim).filter(|n| !n.is_empty()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;
        Ok(entry)
    }

    pub async fn remove(&self, employer_id: Uuid, candidate_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM shortlist_entries WHERE employer_id = $1 AND candidate_id = $2",
        )
        .bind(employer_id)
        .bind(candidate_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Candidate is not on your shortlist".into()));
        }
        Ok(())
    }

    pub async fn list(&self, employer_id: Uuid) -> Result<Vec<ShortlistEntry>> {
        let entries = sqlx::query_as::<_, ShortlistEntry>(
            r#"
            SELECT employer_id, candidate_id, note, created_at
            FROM shortlist_entries
            WHERE employer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
