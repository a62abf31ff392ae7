use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::purchase::PaymentStatus;
use crate::domain::models::token::TokenType;
use crate::domain::models::wizard::{WizardSession, WizardStep};
use crate::domain::services::addons::AddonSummary;
use crate::domain::services::capacity::TicketAvailability;
use crate::domain::services::token_lifecycle::TokenValidation;

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub reason: Option<String>,
    pub cancelled: bool,
    pub expired: bool,
    pub used: bool,
}

impl From<TokenValidation> for ValidationResponse {
    fn from(v: TokenValidation) -> Self {
        Self {
            valid: v.valid,
            reason: v.reason,
            cancelled: v.cancelled,
            expired: v.expired,
            used: v.used,
        }
    }
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub step: WizardStep,
    pub token_code: String,
    pub token_type: TokenType,
    pub skip_ticket: bool,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub ticket_key: Option<String>,
    pub addon_keys: Vec<String>,
    pub addon_total: i64,
    pub expires_at: DateTime<Utc>,
    pub tickets: Vec<TicketAvailability>,
}

impl SessionResponse {
    pub fn new(
        session: &WizardSession,
        code: &str,
        token_type: TokenType,
        addon_total: i64,
        tickets: Vec<TicketAvailability>,
    ) -> Self {
        Self {
            session_id: session.id.clone(),
            step: session.step,
            token_code: code.to_string(),
            token_type,
            skip_ticket: token_type.skips_ticket_selection(),
            attendee_name: session.attendee_name.clone(),
            attendee_email: session.attendee_email.clone(),
            attendee_phone: session.attendee_phone.clone(),
            ticket_key: session.ticket_key.clone(),
            addon_keys: session.addon_keys.0.clone(),
            addon_total,
            expires_at: session.expires_at,
            tickets,
        }
    }
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub purchase_id: String,
    pub payment_reference: String,
    pub ticket_key: Option<String>,
    pub ticket_price: i64,
    pub addons: Vec<AddonSummary>,
    pub addon_total: i64,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
}
