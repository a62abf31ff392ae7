use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// How long an abandoned wizard session stays redeemable. Mirrors the
/// 30-minute session window the booking front-end advertises.
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Declaration order is flow order; the progress pointer only moves
/// forward even when earlier steps are revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum WizardStep {
    Attendee,
    Ticket,
    Addons,
    Checkout,
    Done,
}

/// Server-side state for one walk through the booking wizard, keyed by the
/// session id the client carries between steps. Replaces nothing in the
/// purchase model: a session that never checks out leaves no purchase row.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WizardSession {
    pub id: String,
    pub token_id: String,
    pub step: WizardStep,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub ticket_key: Option<String>,
    pub addon_keys: Json<Vec<String>>,
    pub purchase_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WizardSession {
    pub fn new(token_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            token_id,
            step: WizardStep::Attendee,
            attendee_name: None,
            attendee_email: None,
            attendee_phone: None,
            ticket_key: None,
            addon_keys: Json(Vec::new()),
            purchase_id: None,
            created_at: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Every successful step write pushes the window forward.
    pub fn touch(&mut self) {
        self.expires_at = Utc::now() + Duration::minutes(SESSION_TTL_MINUTES);
    }

    pub fn attendee_complete(&self) -> bool {
        self.attendee_name.is_some() && self.attendee_email.is_some() && self.attendee_phone.is_some()
    }
}
