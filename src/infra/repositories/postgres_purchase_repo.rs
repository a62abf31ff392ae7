use crate::domain::models::addon::PurchaseAddon;
use crate::domain::models::purchase::Purchase;
use crate::domain::ports::PurchaseRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

pub struct PostgresPurchaseRepo {
    pool: PgPool,
}

impl PostgresPurchaseRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepo {
    async fn create(&self, purchase: &Purchase, addons: &[PurchaseAddon]) -> Result<Purchase, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, Purchase>(
            "INSERT INTO purchases (id, token_id, payment_reference, attendee_name, attendee_email, attendee_phone, ticket_key, ticket_price, addon_total, total_amount, total_drink_count, payment_status, created_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *"
        )
            .bind(&purchase.id).bind(&purchase.token_id).bind(&purchase.payment_reference)
            .bind(&purchase.attendee_name).bind(&purchase.attendee_email).bind(&purchase.attendee_phone)
            .bind(&purchase.ticket_key).bind(purchase.ticket_price).bind(purchase.addon_total)
            .bind(purchase.total_amount).bind(purchase.total_drink_count).bind(purchase.payment_status)
            .bind(purchase.created_at).bind(purchase.completed_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for addon in addons {
            sqlx::query("INSERT INTO purchase_addons (id, purchase_id, addon_key, price, is_free, position, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(&addon.id).bind(&addon.purchase_id).bind(&addon.addon_key).bind(addon.price)
                .bind(addon.is_free).bind(addon.position).bind(addon.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Purchase>, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Purchase>, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE payment_reference = $1").bind(reference).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_token(&self, token_id: &str) -> Result<Option<Purchase>, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE token_id = $1 ORDER BY created_at DESC LIMIT 1").bind(token_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self) -> Result<Vec<Purchase>, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, purchase: &Purchase) -> Result<Purchase, AppError> {
        sqlx::query_as::<_, Purchase>(
            "UPDATE purchases SET attendee_name=$1, attendee_email=$2, attendee_phone=$3, ticket_key=$4, ticket_price=$5, addon_total=$6, total_amount=$7, total_drink_count=$8
             WHERE id=$9
             RETURNING *"
        )
            .bind(&purchase.attendee_name).bind(&purchase.attendee_email).bind(&purchase.attendee_phone)
            .bind(&purchase.ticket_key).bind(purchase.ticket_price).bind(purchase.addon_total)
            .bind(purchase.total_amount).bind(purchase.total_drink_count).bind(&purchase.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Purchase not found".into()))
    }
    async fn mark_completed(&self, id: &str, completed_at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE purchases SET payment_status = 'completed', completed_at = $1 WHERE id = $2 AND payment_status = 'pending'").bind(completed_at).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn mark_failed(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE purchases SET payment_status = 'failed' WHERE id = $1 AND payment_status = 'pending'").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn count_completed(&self) -> Result<i64, AppError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM purchases WHERE payment_status = 'completed'").fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count"))
    }
    async fn set_drink_count(&self, id: &str, drink_count: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE purchases SET total_drink_count = $1 WHERE id = $2").bind(drink_count).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn add_addon(&self, addon: &PurchaseAddon) -> Result<PurchaseAddon, AppError> {
        sqlx::query_as::<_, PurchaseAddon>(
            "INSERT INTO purchase_addons (id, purchase_id, addon_key, price, is_free, position, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
        )
            .bind(&addon.id).bind(&addon.purchase_id).bind(&addon.addon_key).bind(addon.price)
            .bind(addon.is_free).bind(addon.position).bind(addon.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_addons(&self, purchase_id: &str) -> Result<Vec<PurchaseAddon>, AppError> {
        sqlx::query_as::<_, PurchaseAddon>("SELECT * FROM purchase_addons WHERE purchase_id = $1 ORDER BY position DESC").bind(purchase_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
