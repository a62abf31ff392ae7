use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CancelTokenRequest, GenerateTokensRequest, ListTokensQuery, UpdateRecipientRequest};
use crate::api::dtos::responses::ValidationResponse;
use crate::api::extractors::auth::AdminKey;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const MAX_BATCH_SIZE: u32 = 500;

pub async fn generate_tokens(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Json(payload): Json<GenerateTokensRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.count == 0 || payload.count > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "Count must be between 1 and {}",
            MAX_BATCH_SIZE
        )));
    }

    let tokens = state
        .token_lifecycle
        .generate(payload.token_type, payload.count, Some("admin"))
        .await;

    Ok(Json(serde_json::json!({
        "requested": payload.count,
        "generated": tokens.len(),
        "tokens": tokens,
    })))
}

pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Query(query): Query<ListTokensQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tokens = state.token_repo.list(query.status, query.token_type).await?;
    Ok(Json(tokens))
}

pub async fn get_token(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(token_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.token_repo.find_by_id(&token_id).await?
        .ok_or(AppError::NotFound("Token not found".into()))?;
    Ok(Json(token))
}

pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(token_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.token_repo.find_by_id(&token_id).await?
        .ok_or(AppError::NotFound("Token not found".into()))?;

    let invitations = state.token_repo.list_by_parent(&token.id).await?;
    Ok(Json(invitations))
}

pub async fn cancel_token(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(token_id): Path<String>,
    Json(payload): Json<CancelTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state
        .token_lifecycle
        .cancel(&token_id, &payload.reason, "admin")
        .await?;

    if !cancelled {
        return Err(AppError::Conflict("Token has already been used or cancelled".into()));
    }

    info!("Token {} cancelled by admin", token_id);
    Ok(Json(serde_json::json!({"status": "cancelled"})))
}

pub async fn update_recipient(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(token_id): Path<String>,
    Json(payload): Json<UpdateRecipientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .token_repo
        .update_recipient(&token_id, payload.name, payload.email)
        .await?;
    Ok(Json(updated))
}

/// Public pre-check used by the wizard's first screen. Always 200; the
/// body says whether the code can start a booking.
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let validation = state.token_lifecycle.validate(&code).await?;
    Ok(Json(ValidationResponse::from(validation)))
}
