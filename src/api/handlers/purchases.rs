use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::UpdatePurchaseRequest;
use crate::api::extractors::auth::AdminKey;
use crate::error::AppError;
use std::sync::Arc;
use tracing::warn;

pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<impl IntoResponse, AppError> {
    let purchases = state.purchase_repo.list().await?;
    Ok(Json(purchases))
}

pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(purchase_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let purchase = state.purchase_repo.find_by_id(&purchase_id).await?
        .ok_or(AppError::NotFound("Purchase not found".into()))?;

    let addons = state.purchase_repo.list_addons(&purchase.id).await?;
    Ok(Json(serde_json::json!({
        "purchase": purchase,
        "addons": addons,
    })))
}

pub async fn update_purchase(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(purchase_id): Path<String>,
    Json(payload): Json<UpdatePurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut purchase = state.purchase_repo.find_by_id(&purchase_id).await?
        .ok_or(AppError::NotFound("Purchase not found".into()))?;

    if let Some(name) = payload.attendee_name { purchase.attendee_name = name; }
    if let Some(email) = payload.attendee_email { purchase.attendee_email = email; }
    if let Some(phone) = payload.attendee_phone { purchase.attendee_phone = phone; }
    if let Some(ticket_price) = payload.ticket_price { purchase.ticket_price = ticket_price; }
    if let Some(addon_total) = payload.addon_total { purchase.addon_total = addon_total; }

    if purchase.reconcile_totals() {
        warn!(
            "Purchase {} total corrected to {} during update",
            purchase.id, purchase.total_amount
        );
    }

    let updated = state.purchase_repo.update(&purchase).await?;
    Ok(Json(updated))
}

/// Wristband endpoint for the door crew: how many drinks this purchase is
/// entitled to.
pub async fn purchase_drinks(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(purchase_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let drink_count = state.addons.drink_count(&purchase_id).await?;
    Ok(Json(serde_json::json!({
        "purchase_id": purchase_id,
        "drink_count": drink_count,
    })))
}
