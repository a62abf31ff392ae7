use crate::domain::models::{
    addon::{Addon, PurchaseAddon}, capacity::CapacityConfig, purchase::Purchase,
    ticket::TicketType, token::{Token, TokenStatus, TokenType, TokenUser},
    wizard::WizardSession,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: &Token) -> Result<Token, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Token>, AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, AppError>;
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;
    async fn list(&self, status: Option<TokenStatus>, token_type: Option<TokenType>) -> Result<Vec<Token>, AppError>;
    async fn list_by_parent(&self, parent_id: &str) -> Result<Vec<Token>, AppError>;
    /// Compare-and-set redemption; false means another request won the race.
    async fn mark_used(&self, id: &str, user: &TokenUser, used_at: DateTime<Utc>) -> Result<bool, AppError>;
    async fn mark_cancelled(&self, id: &str, reason: &str, cancelled_by: &str) -> Result<bool, AppError>;
    async fn mark_expired(&self, id: &str) -> Result<bool, AppError>;
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
    /// Active unused tokens in release order: non-normal types first, oldest first.
    async fn find_unused_active(&self, limit: i64) -> Result<Vec<Token>, AppError>;
    async fn update_recipient(&self, id: &str, name: Option<String>, email: Option<String>) -> Result<Token, AppError>;
}

#[async_trait]
pub trait CapacityConfigRepository: Send + Sync {
    async fn active(&self) -> Result<Option<CapacityConfig>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<CapacityConfig>, AppError>;
    async fn history(&self) -> Result<Vec<CapacityConfig>, AppError>;
    /// Deactivates the current row and inserts the replacement in one transaction.
    async fn replace_active(&self, config: &CapacityConfig) -> Result<CapacityConfig, AppError>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn create(&self, purchase: &Purchase, addons: &[PurchaseAddon]) -> Result<Purchase, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Purchase>, AppError>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Purchase>, AppError>;
    async fn find_by_token(&self, token_id: &str) -> Result<Option<Purchase>, AppError>;
    async fn list(&self) -> Result<Vec<Purchase>, AppError>;
    async fn update(&self, purchase: &Purchase) -> Result<Purchase, AppError>;
    /// Compare-and-set: pending -> completed. False if already settled.
    async fn mark_completed(&self, id: &str, completed_at: DateTime<Utc>) -> Result<bool, AppError>;
    async fn mark_failed(&self, id: &str) -> Result<bool, AppError>;
    async fn count_completed(&self) -> Result<i64, AppError>;
    async fn set_drink_count(&self, id: &str, drink_count: i64) -> Result<(), AppError>;
    async fn add_addon(&self, addon: &PurchaseAddon) -> Result<PurchaseAddon, AppError>;
    /// Addon rows for a purchase, newest first.
    async fn list_addons(&self, purchase_id: &str) -> Result<Vec<PurchaseAddon>, AppError>;
}

#[async_trait]
pub trait AddonRepository: Send + Sync {
    async fn create(&self, addon: &Addon) -> Result<Addon, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Addon>, AppError>;
    async fn find_by_key(&self, key: &str) -> Result<Option<Addon>, AppError>;
    async fn list(&self, include_disabled: bool) -> Result<Vec<Addon>, AppError>;
    async fn update(&self, addon: &Addon) -> Result<Addon, AppError>;
    async fn disable(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TicketTypeRepository: Send + Sync {
    async fn create(&self, ticket: &TicketType) -> Result<TicketType, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<TicketType>, AppError>;
    async fn find_by_key(&self, key: &str) -> Result<Option<TicketType>, AppError>;
    async fn list(&self, include_disabled: bool) -> Result<Vec<TicketType>, AppError>;
    async fn update(&self, ticket: &TicketType) -> Result<TicketType, AppError>;
}

#[async_trait]
pub trait WizardSessionRepository: Send + Sync {
    async fn create(&self, session: &WizardSession) -> Result<WizardSession, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<WizardSession>, AppError>;
    async fn update(&self, session: &WizardSession) -> Result<WizardSession, AppError>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn token_cancelled(&self, token: &Token, recipient_email: &str, reason: &str) -> Result<(), AppError>;
    async fn purchase_confirmed(&self, purchase: &Purchase, invitation_codes: &[String]) -> Result<(), AppError>;
}
