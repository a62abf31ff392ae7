use std::sync::Arc;
use crate::domain::ports::{
    AddonRepository, CapacityConfigRepository, Notifier, PurchaseRepository,
    TicketTypeRepository, TokenRepository, WizardSessionRepository,
};
use crate::domain::services::addons::AddonLedger;
use crate::domain::services::capacity::CapacityTracker;
use crate::domain::services::pricing::PricingEngine;
use crate::domain::services::token_lifecycle::TokenLifecycle;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub token_repo: Arc<dyn TokenRepository>,
    pub capacity_repo: Arc<dyn CapacityConfigRepository>,
    pub purchase_repo: Arc<dyn PurchaseRepository>,
    pub addon_repo: Arc<dyn AddonRepository>,
    pub ticket_repo: Arc<dyn TicketTypeRepository>,
    pub wizard_repo: Arc<dyn WizardSessionRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub token_lifecycle: Arc<TokenLifecycle>,
    pub capacity: Arc<CapacityTracker>,
    pub pricing: Arc<PricingEngine>,
    pub addons: Arc<AddonLedger>,
}
