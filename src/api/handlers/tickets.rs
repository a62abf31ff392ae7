use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CreateTicketTypeRequest, UpdateTicketTypeRequest};
use crate::api::extractors::auth::AdminKey;
use crate::domain::models::ticket::TicketType;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<impl IntoResponse, AppError> {
    let tickets = state.ticket_repo.list(true).await?;
    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Json(payload): Json<CreateTicketTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.key.trim().is_empty() {
        return Err(AppError::Validation("Ticket key is required".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }

    let ticket = TicketType::new(
        payload.key,
        payload.name,
        payload.price,
        payload.sort_order.unwrap_or(0),
    );
    let created = state.ticket_repo.create(&ticket).await?;

    info!("Ticket type created: {}", created.key);
    Ok(Json(created))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(ticket_id): Path<String>,
    Json(payload): Json<UpdateTicketTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut ticket = state.ticket_repo.find_by_id(&ticket_id).await?
        .ok_or(AppError::NotFound("Ticket type not found".into()))?;

    if let Some(name) = payload.name { ticket.name = name; }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("Price cannot be negative".into()));
        }
        ticket.price = price;
    }
    if let Some(is_enabled) = payload.is_enabled { ticket.is_enabled = is_enabled; }
    if let Some(sort_order) = payload.sort_order { ticket.sort_order = sort_order; }
    ticket.updated_at = Utc::now();

    let updated = state.ticket_repo.update(&ticket).await?;
    Ok(Json(updated))
}
