use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A purchasable ticket class. Which one is on sale at any moment is
/// decided by the capacity tier, not by flags on this record.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TicketType {
    pub id: String,
    pub key: String,
    pub name: String,
    pub price: i64,
    pub is_enabled: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    pub fn new(key: String, name: String, price: i64, sort_order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            key,
            name,
            price,
            is_enabled: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}
