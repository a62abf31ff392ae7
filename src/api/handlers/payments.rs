use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::GatewayKey;
use crate::domain::models::purchase::Purchase;
use crate::domain::models::token::TokenUser;
use crate::domain::services::token_lifecycle::INVITATIONS_PER_PURCHASE;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};

/// Post-payment settlement. The caller must have won the
/// pending -> completed CAS on the purchase, which makes this run at most
/// once per purchase.
pub(crate) async fn finalize_completed_purchase(
    state: &AppState,
    purchase: &Purchase,
) -> Result<Vec<String>, AppError> {
    let attendee = TokenUser {
        name: purchase.attendee_name.clone(),
        email: purchase.attendee_email.clone(),
        phone: purchase.attendee_phone.clone(),
    };

    let consumed = state
        .token_lifecycle
        .use_token(&purchase.token_id, &attendee)
        .await?;
    if !consumed {
        warn!(
            "Purchase {} completed but token {} was already consumed",
            purchase.id, purchase.token_id
        );
    }

    // Invitations chain off the token; only the purchase that consumed it
    // spawns them.
    let invitations = if consumed {
        state
            .token_lifecycle
            .generate_invitations(&purchase.token_id, INVITATIONS_PER_PURCHASE)
            .await
    } else {
        Vec::new()
    };
    let codes: Vec<String> = invitations.into_iter().map(|t| t.code).collect();

    let drinks = state.addons.drink_count(&purchase.id).await?;
    state.purchase_repo.set_drink_count(&purchase.id, drinks).await?;

    let confirmed = state
        .purchase_repo
        .find_by_id(&purchase.id)
        .await?
        .ok_or(AppError::Internal)?;
    if let Err(err) = state.notifier.purchase_confirmed(&confirmed, &codes).await {
        warn!("Confirmation notification for purchase {} failed: {}", purchase.id, err);
    }

    info!(
        "Purchase {} settled: {} drinks, {} invitations",
        purchase.id, drinks, codes.len()
    );
    Ok(codes)
}

pub async fn complete_payment(
    State(state): State<Arc<AppState>>,
    _gateway: GatewayKey,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let purchase = state.purchase_repo.find_by_reference(&reference).await?
        .ok_or(AppError::NotFound("Purchase not found".into()))?;

    if !state.purchase_repo.mark_completed(&purchase.id, Utc::now()).await? {
        return Err(AppError::Conflict("Payment has already been processed".into()));
    }

    let invitation_codes = finalize_completed_purchase(&state, &purchase).await?;

    info!("Payment completed for reference {}", reference);
    Ok(Json(serde_json::json!({
        "status": "completed",
        "purchase_id": purchase.id,
        "invitation_codes": invitation_codes,
    })))
}

pub async fn fail_payment(
    State(state): State<Arc<AppState>>,
    _gateway: GatewayKey,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let purchase = state.purchase_repo.find_by_reference(&reference).await?
        .ok_or(AppError::NotFound("Purchase not found".into()))?;

    if !state.purchase_repo.mark_failed(&purchase.id).await? {
        return Err(AppError::Conflict("Payment has already been processed".into()));
    }

    info!("Payment failed for reference {}", reference);
    Ok(Json(serde_json::json!({
        "status": "failed",
        "purchase_id": purchase.id,
    })))
}
