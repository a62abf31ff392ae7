use crate::domain::models::addon::Addon;
use crate::domain::ports::AddonRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAddonRepo {
    pool: PgPool,
}

impl PostgresAddonRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddonRepository for PostgresAddonRepo {
    async fn create(&self, addon: &Addon) -> Result<Addon, AppError> {
        sqlx::query_as::<_, Addon>(
            "INSERT INTO addons (id, key, name, price, drink_count, is_enabled, sort_order, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *"
        )
            .bind(&addon.id).bind(&addon.key).bind(&addon.name).bind(addon.price)
            .bind(addon.drink_count).bind(addon.is_enabled).bind(addon.sort_order)
            .bind(addon.created_at).bind(addon.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Addon>, AppError> {
        sqlx::query_as::<_, Addon>("SELECT * FROM addons WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_key(&self, key: &str) -> Result<Option<Addon>, AppError> {
        sqlx::query_as::<_, Addon>("SELECT * FROM addons WHERE key = $1").bind(key).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, include_disabled: bool) -> Result<Vec<Addon>, AppError> {
        let query = if include_disabled {
            "SELECT * FROM addons ORDER BY sort_order ASC"
        } else {
            "SELECT * FROM addons WHERE is_enabled = TRUE ORDER BY sort_order ASC"
        };
        sqlx::query_as::<_, Addon>(query).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, addon: &Addon) -> Result<Addon, AppError> {
        sqlx::query_as::<_, Addon>(
            "UPDATE addons SET name=$1, price=$2, drink_count=$3, is_enabled=$4, sort_order=$5, updated_at=$6 WHERE id=$7 RETURNING *"
        )
            .bind(&addon.name).bind(addon.price).bind(addon.drink_count).bind(addon.is_enabled)
            .bind(addon.sort_order).bind(addon.updated_at).bind(&addon.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Addon not found".into()))
    }
    async fn disable(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE addons SET is_enabled = FALSE, updated_at = $1 WHERE id = $2").bind(chrono::Utc::now()).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
