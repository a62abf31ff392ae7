use crate::domain::models::token::{Token, TokenStatus, TokenType, TokenUser};
use crate::domain::ports::TokenRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteTokenRepo {
    pool: SqlitePool,
}

impl SqliteTokenRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepo {
    async fn create(&self, token: &Token) -> Result<Token, AppError> {
        sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (id, code, token_type, parent_id, status, is_used, used_by_name, used_by_email, used_by_phone, sent_to_name, sent_to_email, cancellation_reason, cancelled_by, created_by, created_at, used_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&token.id).bind(&token.code).bind(token.token_type).bind(&token.parent_id)
            .bind(token.status).bind(token.is_used).bind(&token.used_by_name).bind(&token.used_by_email)
            .bind(&token.used_by_phone).bind(&token.sent_to_name).bind(&token.sent_to_email)
            .bind(&token.cancellation_reason).bind(&token.cancelled_by).bind(&token.created_by)
            .bind(token.created_at).bind(token.used_at).bind(token.expires_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Token>, AppError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, AppError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE code = ?").bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM tokens WHERE code = ?").bind(code).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count") > 0)
    }
    async fn list(&self, status: Option<TokenStatus>, token_type: Option<TokenType>) -> Result<Vec<Token>, AppError> {
        let status = status.map(|s| s.as_str());
        let token_type = token_type.map(|t| t.as_str());
        sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE (? IS NULL OR status = ?) AND (? IS NULL OR token_type = ?) ORDER BY created_at DESC"
        )
            .bind(status).bind(status).bind(token_type).bind(token_type)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_parent(&self, parent_id: &str) -> Result<Vec<Token>, AppError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE parent_id = ? ORDER BY created_at ASC").bind(parent_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn mark_used(&self, id: &str, user: &TokenUser, used_at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tokens SET status = 'used', is_used = 1, used_by_name = ?, used_by_email = ?, used_by_phone = ?, used_at = ? WHERE id = ? AND status = 'active' AND is_used = 0"
        )
            .bind(&user.name).bind(&user.email).bind(&user.phone).bind(used_at).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn mark_cancelled(&self, id: &str, reason: &str, cancelled_by: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tokens SET status = 'cancelled', cancellation_reason = ?, cancelled_by = ? WHERE id = ? AND status = 'active' AND is_used = 0"
        )
            .bind(reason).bind(cancelled_by).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn mark_expired(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tokens SET status = 'expired' WHERE id = ? AND status = 'active'").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE tokens SET status = 'expired' WHERE status = 'active' AND expires_at < ?").bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
    async fn find_unused_active(&self, limit: i64) -> Result<Vec<Token>, AppError> {
        sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE status = 'active' AND is_used = 0 ORDER BY CASE WHEN token_type = 'normal' THEN 1 ELSE 0 END ASC, created_at ASC LIMIT ?"
        )
            .bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_recipient(&self, id: &str, name: Option<String>, email: Option<String>) -> Result<Token, AppError> {
        sqlx::query_as::<_, Token>("UPDATE tokens SET sent_to_name = ?, sent_to_email = ? WHERE id = ? RETURNING *")
            .bind(name).bind(email).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Token not found".into()))
    }
}
