use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Purchase {
    pub id: String,
    pub token_id: String,
    pub payment_reference: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_phone: String,
    pub ticket_key: Option<String>,
    pub ticket_price: i64,
    pub addon_total: i64,
    pub total_amount: i64,
    pub total_drink_count: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct NewPurchaseParams {
    pub token_id: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_phone: String,
    pub ticket_key: Option<String>,
    pub ticket_price: i64,
    pub addon_total: i64,
}

impl Purchase {
    pub fn new(params: NewPurchaseParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token_id: params.token_id,
            payment_reference: new_payment_reference(),
            attendee_name: params.attendee_name,
            attendee_email: params.attendee_email,
            attendee_phone: params.attendee_phone,
            ticket_key: params.ticket_key,
            ticket_price: params.ticket_price,
            addon_total: params.addon_total,
            total_amount: params.ticket_price + params.addon_total,
            total_drink_count: 0,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Restores `total_amount == ticket_price + addon_total`. Returns true
    /// when a correction was applied so the caller can log it.
    pub fn reconcile_totals(&mut self) -> bool {
        let expected = self.ticket_price + self.addon_total;
        if self.total_amount != expected {
            self.total_amount = expected;
            return true;
        }
        false
    }
}

/// Gateway-facing reference: literal "RESET" + last six digits of the unix
/// timestamp + two random digits. The bank-side wrapper matches on the
/// prefix, so the shape is a compatibility constraint.
pub fn new_payment_reference() -> String {
    let tail = Utc::now().timestamp().rem_euclid(1_000_000);
    let mut rng = rand::thread_rng();
    format!(
        "RESET{:06}{}{}",
        tail,
        rng.gen_range(0..10u8),
        rng.gen_range(0..10u8)
    )
}
