use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Addon {
    pub id: String,
    pub key: String,
    pub name: String,
    pub price: i64,
    pub drink_count: i64,
    pub is_enabled: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Addon {
    pub fn new(key: String, name: String, price: i64, drink_count: i64, sort_order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            key,
            name,
            price,
            drink_count,
            is_enabled: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One addon attached to a purchase, priced at attach time. `position` is
/// the insertion ordinal within the purchase; the drink derivation reads
/// only the newest row, so ordering must be exact.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PurchaseAddon {
    pub id: String,
    pub purchase_id: String,
    pub addon_key: String,
    pub price: i64,
    pub is_free: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl PurchaseAddon {
    pub fn new(purchase_id: String, addon_key: String, price: i64, is_free: bool, position: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            purchase_id,
            addon_key,
            price,
            is_free,
            position,
            created_at: Utc::now(),
        }
    }
}
