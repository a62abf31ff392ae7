pub mod sqlite_addon_repo;
pub mod sqlite_capacity_repo;
pub mod sqlite_purchase_repo;
pub mod sqlite_ticket_repo;
pub mod sqlite_token_repo;
pub mod sqlite_wizard_repo;

pub mod postgres_addon_repo;
pub mod postgres_capacity_repo;
pub mod postgres_purchase_repo;
pub mod postgres_ticket_repo;
pub mod postgres_token_repo;
pub mod postgres_wizard_repo;
