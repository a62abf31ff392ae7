use serde::Deserialize;

use crate::domain::models::token::{TokenStatus, TokenType};

#[derive(Deserialize)]
pub struct StartBookingRequest {
    pub code: String,
}

#[derive(Deserialize)]
pub struct AttendeeRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct TicketSelectionRequest {
    pub ticket_key: String,
}

#[derive(Deserialize)]
pub struct AddonSelectionRequest {
    pub keys: Vec<String>,
}

#[derive(Deserialize)]
pub struct GenerateTokensRequest {
    pub token_type: TokenType,
    pub count: u32,
}

#[derive(Deserialize)]
pub struct ListTokensQuery {
    pub status: Option<TokenStatus>,
    pub token_type: Option<TokenType>,
}

#[derive(Deserialize)]
pub struct CancelTokenRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct UpdateRecipientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateAddonRequest {
    pub key: String,
    pub name: String,
    pub price: i64,
    pub drink_count: i64,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateAddonRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub drink_count: Option<i64>,
    pub is_enabled: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateTicketTypeRequest {
    pub key: String,
    pub name: String,
    pub price: i64,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateTicketTypeRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub is_enabled: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdatePurchaseRequest {
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub ticket_price: Option<i64>,
    pub addon_total: Option<i64>,
}
