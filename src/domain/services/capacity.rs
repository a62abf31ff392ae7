use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::models::capacity::{CapacityConfig, CapacitySettings, CapacityStatus, Tier};
use crate::domain::models::ticket::TicketType;
use crate::domain::ports::{CapacityConfigRepository, PurchaseRepository, TicketTypeRepository};
use crate::domain::services::pricing;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct TicketAvailability {
    pub key: String,
    pub name: String,
    pub price: i64,
    pub available: bool,
    pub reason: Option<String>,
}

/// One row per catalogue entry; at most one is available — the entry the
/// current tier maps to — and every other row carries a human-readable
/// reason. At max capacity everything reads "sold out".
pub fn derive_availability(
    tickets: &[TicketType],
    config: &CapacityConfig,
    current: i64,
) -> Vec<TicketAvailability> {
    let at_capacity = current >= config.max_capacity;
    let tier = config.tier_for_count(current);
    let active_key = pricing::ticket_key_for_tier(tier);

    tickets
        .iter()
        .map(|ticket| {
            let mut row = TicketAvailability {
                key: ticket.key.clone(),
                name: ticket.name.clone(),
                price: ticket.price,
                available: false,
                reason: None,
            };

            if at_capacity {
                row.reason = Some("Event is sold out".to_string());
                return row;
            }

            if Some(ticket.key.as_str()) == active_key && ticket.is_enabled {
                row.available = true;
                return row;
            }

            row.reason = Some(match pricing::tier_for_ticket_key(&ticket.key) {
                Some(ticket_tier) if ticket_tier < tier => {
                    format!("{} period has ended", ticket_tier.display_name())
                }
                Some(ticket_tier) => {
                    format!("Available after {} tickets sold", config.tier_opens_after(ticket_tier))
                }
                None => "Not currently available".to_string(),
            });
            row
        })
        .collect()
}

pub struct CapacityTracker {
    configs: Arc<dyn CapacityConfigRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    tickets: Arc<dyn TicketTypeRepository>,
}

impl CapacityTracker {
    pub fn new(
        configs: Arc<dyn CapacityConfigRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        tickets: Arc<dyn TicketTypeRepository>,
    ) -> Self {
        Self { configs, purchases, tickets }
    }

    /// The single active configuration row. Migrations seed one, so its
    /// absence is a broken deployment, not a caller error.
    pub async fn active_config(&self) -> Result<CapacityConfig, AppError> {
        self.configs.active().await?.ok_or_else(|| {
            AppError::InternalWithMsg("no active capacity configuration".to_string())
        })
    }

    /// Completed purchases are the attendee count. Derived on every call;
    /// never cached, so it cannot go stale.
    pub async fn current_count(&self) -> Result<i64, AppError> {
        self.purchases.count_completed().await
    }

    pub async fn status(&self) -> Result<CapacityStatus, AppError> {
        let config = self.active_config().await?;
        let current = self.current_count().await?;
        Ok(CapacityStatus::derive(current, &config))
    }

    pub async fn current_tier(&self) -> Result<Tier, AppError> {
        let config = self.active_config().await?;
        let current = self.current_count().await?;
        Ok(config.tier_for_count(current))
    }

    pub async fn ticket_availability(&self) -> Result<Vec<TicketAvailability>, AppError> {
        let config = self.active_config().await?;
        let current = self.current_count().await?;
        let tickets = self.tickets.list(false).await?;
        Ok(derive_availability(&tickets, &config, current))
    }

    /// Validates, normalizes thresholds, and replaces the active row with a
    /// fresh one carrying a field-by-field change note. History is
    /// append-only.
    pub async fn update_config(
        &self,
        mut settings: CapacitySettings,
        actor: Option<&str>,
    ) -> Result<CapacityConfig, AppError> {
        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(AppError::ValidationList(errors));
        }
        settings.normalize_thresholds();

        let previous = self.configs.active().await?;
        let note = settings.change_note(previous.as_ref());
        let config = settings.into_config(note, actor.map(str::to_string));
        let saved = self.configs.replace_active(&config).await?;
        info!(
            config_id = %saved.id,
            note = saved.change_note.as_deref().unwrap_or(""),
            "capacity configuration replaced"
        );
        Ok(saved)
    }

    /// Reactivates a historical row's values as a NEW active row. The
    /// historical row itself is never touched.
    pub async fn rollback(
        &self,
        config_id: &str,
        actor: Option<&str>,
    ) -> Result<CapacityConfig, AppError> {
        let Some(historical) = self.configs.find_by_id(config_id).await? else {
            return Err(AppError::NotFound(format!("Capacity configuration {} not found", config_id)));
        };

        let settings = CapacitySettings::from_config(&historical);
        let note = format!("Rolled back to configuration {}", config_id);
        let config = settings.into_config(note, actor.map(str::to_string));
        let saved = self.configs.replace_active(&config).await?;
        info!(config_id = %saved.id, from = %historical.id, "capacity configuration rolled back");
        Ok(saved)
    }

    pub async fn history(&self) -> Result<Vec<CapacityConfig>, AppError> {
        self.configs.history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config() -> CapacityConfig {
        CapacityConfig {
            id: "cfg".to_string(),
            target_capacity: 300,
            max_capacity: 400,
            alert_threshold: 100,
            early_bird_threshold: 100,
            late_bird_threshold: 150,
            very_late_bird_threshold: 200,
            is_active: true,
            change_note: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn catalogue() -> Vec<TicketType> {
        vec![
            TicketType::new("general_early".to_string(), "Early Bird".to_string(), 3500, 1),
            TicketType::new("general_late".to_string(), "Late Bird".to_string(), 4000, 2),
            TicketType::new("general_very_late".to_string(), "Very Late Bird".to_string(), 4500, 3),
        ]
    }

    #[test]
    fn test_exactly_one_ticket_available_mid_sale() {
        let rows = derive_availability(&catalogue(), &config(), 120);
        let available: Vec<&TicketAvailability> = rows.iter().filter(|r| r.available).collect();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].key, "general_late");

        let early = rows.iter().find(|r| r.key == "general_early").unwrap();
        assert_eq!(early.reason.as_deref(), Some("Early Bird period has ended"));

        let very_late = rows.iter().find(|r| r.key == "general_very_late").unwrap();
        assert_eq!(very_late.reason.as_deref(), Some("Available after 150 tickets sold"));
    }

    #[test]
    fn test_final_tier_has_no_available_ticket() {
        let rows = derive_availability(&catalogue(), &config(), 250);
        assert!(rows.iter().all(|r| !r.available));
        let early = rows.iter().find(|r| r.key == "general_early").unwrap();
        assert_eq!(early.reason.as_deref(), Some("Early Bird period has ended"));
    }

    #[test]
    fn test_sold_out_overrides_everything() {
        let rows = derive_availability(&catalogue(), &config(), 400);
        assert!(rows.iter().all(|r| !r.available));
        assert!(rows.iter().all(|r| r.reason.as_deref() == Some("Event is sold out")));
    }

    #[test]
    fn test_disabled_active_ticket_is_not_available() {
        let mut tickets = catalogue();
        tickets[0].is_enabled = false;
        let rows = derive_availability(&tickets, &config(), 10);
        let early = rows.iter().find(|r| r.key == "general_early").unwrap();
        assert!(!early.available);
    }
}
