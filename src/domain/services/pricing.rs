use std::sync::Arc;

use crate::domain::models::capacity::Tier;
use crate::domain::models::ticket::TicketType;
use crate::domain::ports::TicketTypeRepository;
use crate::error::AppError;

/// Which catalogue key is on sale during each tier. Callers consult this
/// mapping, never the raw thresholds; in the final tier nothing is
/// purchasable.
pub fn ticket_key_for_tier(tier: Tier) -> Option<&'static str> {
    match tier {
        Tier::EarlyBird => Some("general_early"),
        Tier::LateBird => Some("general_late"),
        Tier::VeryLateBird => Some("general_very_late"),
        Tier::Final => None,
    }
}

pub fn tier_for_ticket_key(key: &str) -> Option<Tier> {
    match key {
        "general_early" => Some(Tier::EarlyBird),
        "general_late" => Some(Tier::LateBird),
        "general_very_late" => Some(Tier::VeryLateBird),
        _ => None,
    }
}

pub struct PricingEngine {
    tickets: Arc<dyn TicketTypeRepository>,
}

impl PricingEngine {
    pub fn new(tickets: Arc<dyn TicketTypeRepository>) -> Self {
        Self { tickets }
    }

    /// Configured price when the ticket exists and is enabled, else 0.
    pub async fn price_for(&self, ticket_key: &str) -> Result<i64, AppError> {
        Ok(match self.tickets.find_by_key(ticket_key).await? {
            Some(ticket) if ticket.is_enabled => ticket.price,
            _ => 0,
        })
    }

    /// The catalogue entry on sale for the given tier, if any.
    pub async fn active_ticket(&self, tier: Tier) -> Result<Option<TicketType>, AppError> {
        let Some(key) = ticket_key_for_tier(tier) else {
            return Ok(None);
        };
        self.tickets.find_by_key(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ticket_mapping() {
        assert_eq!(ticket_key_for_tier(Tier::EarlyBird), Some("general_early"));
        assert_eq!(ticket_key_for_tier(Tier::LateBird), Some("general_late"));
        assert_eq!(ticket_key_for_tier(Tier::VeryLateBird), Some("general_very_late"));
        assert_eq!(ticket_key_for_tier(Tier::Final), None);
    }

    #[test]
    fn test_mapping_round_trips() {
        for tier in [Tier::EarlyBird, Tier::LateBird, Tier::VeryLateBird] {
            let key = ticket_key_for_tier(tier).unwrap();
            assert_eq!(tier_for_ticket_key(key), Some(tier));
        }
        assert_eq!(tier_for_ticket_key("vip_table"), None);
    }
}
