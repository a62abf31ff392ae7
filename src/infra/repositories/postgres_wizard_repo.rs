use crate::domain::models::wizard::WizardSession;
use crate::domain::ports::WizardSessionRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresWizardRepo {
    pool: PgPool,
}

impl PostgresWizardRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WizardSessionRepository for PostgresWizardRepo {
    async fn create(&self, session: &WizardSession) -> Result<WizardSession, AppError> {
        sqlx::query_as::<_, WizardSession>(
            "INSERT INTO wizard_sessions (id, token_id, step, attendee_name, attendee_email, attendee_phone, ticket_key, addon_keys, purchase_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *"
        )
            .bind(&session.id).bind(&session.token_id).bind(session.step)
            .bind(&session.attendee_name).bind(&session.attendee_email).bind(&session.attendee_phone)
            .bind(&session.ticket_key).bind(&session.addon_keys).bind(&session.purchase_id)
            .bind(session.created_at).bind(session.expires_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<WizardSession>, AppError> {
        sqlx::query_as::<_, WizardSession>("SELECT * FROM wizard_sessions WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, session: &WizardSession) -> Result<WizardSession, AppError> {
        sqlx::query_as::<_, WizardSession>(
            "UPDATE wizard_sessions SET step=$1, attendee_name=$2, attendee_email=$3, attendee_phone=$4, ticket_key=$5, addon_keys=$6, purchase_id=$7, expires_at=$8
             WHERE id=$9
             RETURNING *"
        )
            .bind(session.step).bind(&session.attendee_name).bind(&session.attendee_email)
            .bind(&session.attendee_phone).bind(&session.ticket_key).bind(&session.addon_keys)
            .bind(&session.purchase_id).bind(session.expires_at).bind(&session.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking session not found".into()))
    }
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM wizard_sessions WHERE expires_at < $1").bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
