use crate::domain::models::capacity::CapacityConfig;
use crate::domain::ports::CapacityConfigRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCapacityRepo {
    pool: PgPool,
}

impl PostgresCapacityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapacityConfigRepository for PostgresCapacityRepo {
    async fn active(&self) -> Result<Option<CapacityConfig>, AppError> {
        sqlx::query_as::<_, CapacityConfig>("SELECT * FROM capacity_configs WHERE is_active = TRUE ORDER BY created_at DESC LIMIT 1").fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<CapacityConfig>, AppError> {
        sqlx::query_as::<_, CapacityConfig>("SELECT * FROM capacity_configs WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn history(&self) -> Result<Vec<CapacityConfig>, AppError> {
        sqlx::query_as::<_, CapacityConfig>("SELECT * FROM capacity_configs ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn replace_active(&self, config: &CapacityConfig) -> Result<CapacityConfig, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("UPDATE capacity_configs SET is_active = FALSE WHERE is_active = TRUE").execute(&mut *tx).await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, CapacityConfig>(
            "INSERT INTO capacity_configs (id, target_capacity, max_capacity, alert_threshold, early_bird_threshold, late_bird_threshold, very_late_bird_threshold, is_active, change_note, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10)
             RETURNING *"
        )
            .bind(&config.id).bind(config.target_capacity).bind(config.max_capacity).bind(config.alert_threshold)
            .bind(config.early_bird_threshold).bind(config.late_bird_threshold).bind(config.very_late_bird_threshold)
            .bind(&config.change_note).bind(&config.created_by).bind(config.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }
}
