use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CreateAddonRequest, UpdateAddonRequest};
use crate::api::extractors::auth::AdminKey;
use crate::domain::models::addon::Addon;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

/// Public catalogue: enabled addons only.
pub async fn list_addons(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let addons = state.addon_repo.list(false).await?;
    Ok(Json(addons))
}

pub async fn list_all_addons(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<impl IntoResponse, AppError> {
    let addons = state.addon_repo.list(true).await?;
    Ok(Json(addons))
}

pub async fn create_addon(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Json(payload): Json<CreateAddonRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.key.trim().is_empty() {
        return Err(AppError::Validation("Addon key is required".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    if payload.drink_count < 0 {
        return Err(AppError::Validation("Drink count cannot be negative".into()));
    }

    let addon = Addon::new(
        payload.key,
        payload.name,
        payload.price,
        payload.drink_count,
        payload.sort_order.unwrap_or(0),
    );
    let created = state.addon_repo.create(&addon).await?;

    info!("Addon created: {}", created.key);
    Ok(Json(created))
}

pub async fn update_addon(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(addon_id): Path<String>,
    Json(payload): Json<UpdateAddonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut addon = state.addon_repo.find_by_id(&addon_id).await?
        .ok_or(AppError::NotFound("Addon not found".into()))?;

    if let Some(name) = payload.name { addon.name = name; }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("Price cannot be negative".into()));
        }
        addon.price = price;
    }
    if let Some(drink_count) = payload.drink_count {
        if drink_count < 0 {
            return Err(AppError::Validation("Drink count cannot be negative".into()));
        }
        addon.drink_count = drink_count;
    }
    if let Some(is_enabled) = payload.is_enabled { addon.is_enabled = is_enabled; }
    if let Some(sort_order) = payload.sort_order { addon.sort_order = sort_order; }
    addon.updated_at = Utc::now();

    let updated = state.addon_repo.update(&addon).await?;
    Ok(Json(updated))
}

/// Addons referenced by historical purchase rows are disabled, never
/// deleted.
pub async fn disable_addon(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(addon_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.addon_repo.disable(&addon_id).await? {
        return Err(AppError::NotFound("Addon not found".into()));
    }

    info!("Addon disabled: {}", addon_id);
    Ok(Json(serde_json::json!({"status": "disabled"})))
}
