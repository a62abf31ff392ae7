use crate::domain::models::wizard::WizardSession;
use crate::domain::ports::WizardSessionRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteWizardRepo {
    pool: SqlitePool,
}

impl SqliteWizardRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WizardSessionRepository for SqliteWizardRepo {
    async fn create(&self, session: &WizardSession) -> Result<WizardSession, AppError> {
        sqlx::query_as::<_, WizardSession>(
            "INSERT INTO wizard_sessions (id, token_id, step, attendee_name, attendee_email, attendee_phone, ticket_key, addon_keys, purchase_id, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&session.id).bind(&session.token_id).bind(session.step)
            .bind(&session.attendee_name).bind(&session.attendee_email).bind(&session.attendee_phone)
            .bind(&session.ticket_key).bind(&session.addon_keys).bind(&session.purchase_id)
            .bind(session.created_at).bind(session.expires_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<WizardSession>, AppError> {
        sqlx::query_as::<_, WizardSession>("SELECT * FROM wizard_sessions WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, session: &WizardSession) -> Result<WizardSession, AppError> {
        sqlx::query_as::<_, WizardSession>(
            "UPDATE wizard_sessions SET step=?, attendee_name=?, attendee_email=?, attendee_phone=?, ticket_key=?, addon_keys=?, purchase_id=?, expires_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(session.step).bind(&session.attendee_name).bind(&session.attendee_email)
            .bind(&session.attendee_phone).bind(&session.ticket_key).bind(&session.addon_keys)
            .bind(&session.purchase_id).bind(session.expires_at).bind(&session.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking session not found".into()))
    }
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM wizard_sessions WHERE expires_at < ?").bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
