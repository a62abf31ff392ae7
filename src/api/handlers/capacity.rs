use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AdminKey;
use crate::domain::models::capacity::CapacitySettings;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Public capacity overview: sales count, active tier, and per-ticket
/// availability.
pub async fn get_capacity(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.capacity.status().await?;
    let tier = state.capacity.current_tier().await?;
    let tickets = state.capacity.ticket_availability().await?;

    Ok(Json(serde_json::json!({
        "status": status,
        "tier": tier.as_str(),
        "tier_name": tier.display_name(),
        "tickets": tickets,
    })))
}

pub async fn update_capacity(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Json(payload): Json<CapacitySettings>,
) -> Result<impl IntoResponse, AppError> {
    let saved = state.capacity.update_config(payload, Some("admin")).await?;
    info!("Capacity configuration updated: {}", saved.id);
    Ok(Json(saved))
}

pub async fn capacity_history(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<impl IntoResponse, AppError> {
    let history = state.capacity.history().await?;
    Ok(Json(history))
}

pub async fn rollback_capacity(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(config_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let saved = state.capacity.rollback(&config_id, Some("admin")).await?;
    info!("Capacity configuration rolled back to {}", config_id);
    Ok(Json(saved))
}
