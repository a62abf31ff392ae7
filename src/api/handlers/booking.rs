use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{AddonSelectionRequest, AttendeeRequest, StartBookingRequest, TicketSelectionRequest};
use crate::api::dtos::responses::{CheckoutResponse, SessionResponse};
use crate::api::handlers::payments::finalize_completed_purchase;
use crate::domain::models::addon::PurchaseAddon;
use crate::domain::models::purchase::{NewPurchaseParams, PaymentStatus, Purchase};
use crate::domain::models::token::{Token, TokenStatus, TokenType};
use crate::domain::models::wizard::{WizardSession, WizardStep};
use crate::domain::services::addons::{charged_price, FREE_PACKAGE_KEY};
use crate::error::AppError;
use std::sync::Arc;
use sqlx::types::Json as SqlJson;
use chrono::Utc;
use tracing::info;

async fn load_session(state: &AppState, session_id: &str) -> Result<(WizardSession, Token), AppError> {
    let session = state.wizard_repo.find_by_id(session_id).await?
        .ok_or(AppError::NotFound("Booking session not found".into()))?;

    if session.is_expired(Utc::now()) {
        return Err(AppError::Conflict("Booking session has expired".into()));
    }

    let token = state.token_repo.find_by_id(&session.token_id).await?
        .ok_or(AppError::Internal)?;

    Ok((session, token))
}

fn advance(session: &mut WizardSession, to: WizardStep) {
    if session.step < to {
        session.step = to;
    }
}

pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let validation = state.token_lifecycle.validate(&payload.code).await?;

    if !validation.valid {
        let reason = validation.reason.unwrap_or_else(|| "Invalid access key".to_string());
        if validation.cancelled || validation.expired || validation.used {
            return Err(AppError::Conflict(reason));
        }
        if payload.code.trim().is_empty() {
            return Err(AppError::Validation(reason));
        }
        return Err(AppError::NotFound(reason));
    }

    let token = validation.token.ok_or(AppError::Internal)?;

    let mut session = WizardSession::new(token.id.clone());
    session.addon_keys = SqlJson(state.addons.default_selection(token.token_type).await?);
    let created = state.wizard_repo.create(&session).await?;

    let tickets = state.capacity.ticket_availability().await?;
    let addon_total = state.addons.compute_total(&created.addon_keys.0, token.token_type).await?;

    info!("Booking session {} started for token {}", created.id, token.code);
    Ok(Json(SessionResponse::new(&created, &token.code, token.token_type, addon_total, tickets)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (session, token) = load_session(&state, &session_id).await?;
    let tickets = state.capacity.ticket_availability().await?;
    let addon_total = state.addons.compute_total(&session.addon_keys.0, token.token_type).await?;
    Ok(Json(SessionResponse::new(&session, &token.code, token.token_type, addon_total, tickets)))
}

pub async fn set_attendee(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AttendeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (mut session, token) = load_session(&state, &session_id).await?;

    let name = payload.name.trim();
    let email = payload.email.trim();
    let phone = payload.phone.trim();

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    if phone.is_empty() {
        return Err(AppError::Validation("Phone number is required".into()));
    }

    session.attendee_name = Some(name.to_string());
    session.attendee_email = Some(email.to_string());
    session.attendee_phone = Some(phone.to_string());

    // Free-ticket holders have no ticket screen.
    if token.token_type.skips_ticket_selection() {
        advance(&mut session, WizardStep::Addons);
    } else {
        advance(&mut session, WizardStep::Ticket);
    }
    session.touch();

    let updated = state.wizard_repo.update(&session).await?;
    let tickets = state.capacity.ticket_availability().await?;
    let addon_total = state.addons.compute_total(&updated.addon_keys.0, token.token_type).await?;
    Ok(Json(SessionResponse::new(&updated, &token.code, token.token_type, addon_total, tickets)))
}

pub async fn select_ticket(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<TicketSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (mut session, token) = load_session(&state, &session_id).await?;

    if token.token_type.skips_ticket_selection() {
        return Err(AppError::Validation("Ticket selection is not required for this key".into()));
    }

    let tickets = state.capacity.ticket_availability().await?;
    let selected = tickets.iter().find(|t| t.key == payload.ticket_key)
        .ok_or(AppError::NotFound("Unknown ticket type".into()))?;

    if !selected.available {
        let reason = selected.reason.clone()
            .unwrap_or_else(|| "Ticket is not currently available".to_string());
        return Err(AppError::Conflict(reason));
    }

    session.ticket_key = Some(payload.ticket_key);
    advance(&mut session, WizardStep::Addons);
    session.touch();

    let updated = state.wizard_repo.update(&session).await?;
    let addon_total = state.addons.compute_total(&updated.addon_keys.0, token.token_type).await?;
    Ok(Json(SessionResponse::new(&updated, &token.code, token.token_type, addon_total, tickets)))
}

pub async fn select_addons(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AddonSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (mut session, token) = load_session(&state, &session_id).await?;

    let check = state.addons.validate_selection(&payload.keys, token.token_type).await?;
    if !check.valid {
        return Err(AppError::Validation(check.errors.join("; ")));
    }

    session.addon_keys = SqlJson(payload.keys);
    advance(&mut session, WizardStep::Checkout);
    session.touch();

    let updated = state.wizard_repo.update(&session).await?;
    let tickets = state.capacity.ticket_availability().await?;
    let addon_total = state.addons.compute_total(&updated.addon_keys.0, token.token_type).await?;
    Ok(Json(SessionResponse::new(&updated, &token.code, token.token_type, addon_total, tickets)))
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (mut session, token) = load_session(&state, &session_id).await?;

    if session.purchase_id.is_some() {
        return Err(AppError::Conflict("Checkout already completed for this session".into()));
    }
    if !session.attendee_complete() {
        return Err(AppError::Validation("Attendee details are incomplete".into()));
    }
    // Re-check the key; it may have been consumed or released since the
    // session started.
    if token.status != TokenStatus::Active || token.is_used {
        return Err(AppError::Conflict("This key is no longer active".into()));
    }

    let (ticket_key, ticket_price) = if token.token_type.skips_ticket_selection() {
        (None, 0)
    } else {
        let key = session.ticket_key.clone()
            .ok_or(AppError::Validation("Select a ticket before checkout".into()))?;

        let tickets = state.capacity.ticket_availability().await?;
        let selected = tickets.iter().find(|t| t.key == key)
            .ok_or(AppError::NotFound("Unknown ticket type".into()))?;
        if !selected.available {
            let reason = selected.reason.clone()
                .unwrap_or_else(|| "Ticket is not currently available".to_string());
            return Err(AppError::Conflict(reason));
        }

        let price = state.pricing.price_for(&key).await?;
        (Some(key), price)
    };

    let keys = session.addon_keys.0.clone();
    let check = state.addons.validate_selection(&keys, token.token_type).await?;
    if !check.valid {
        return Err(AppError::Validation(check.errors.join("; ")));
    }

    // Charged price per selected addon, resolved once so every creation
    // attempt writes identical rows.
    let catalogue = state.addon_repo.list(true).await?;
    let mut priced_keys: Vec<(String, i64)> = Vec::new();
    for key in &keys {
        if token.token_type == TokenType::PoloOrdered && key == FREE_PACKAGE_KEY {
            continue;
        }
        let price = catalogue.iter()
            .find(|a| a.key == *key)
            .map(|a| if a.is_enabled { charged_price(a, token.token_type) } else { 0 })
            .unwrap_or(0);
        priced_keys.push((key.clone(), price));
    }

    let params = NewPurchaseParams {
        token_id: token.id.clone(),
        attendee_name: session.attendee_name.clone().ok_or(AppError::Internal)?,
        attendee_email: session.attendee_email.clone().ok_or(AppError::Internal)?,
        attendee_phone: session.attendee_phone.clone().ok_or(AppError::Internal)?,
        ticket_key: ticket_key.clone(),
        ticket_price,
        addon_total: check.total,
    };

    // Payment references carry a timestamp fragment, so collisions are
    // possible within the same second. Retry with a fresh reference.
    let mut created: Option<Purchase> = None;
    for _ in 0..3 {
        let purchase = Purchase::new(params.clone());

        let mut rows = Vec::new();
        let mut position = 0i64;
        if token.token_type == TokenType::PoloOrdered {
            rows.push(PurchaseAddon::new(purchase.id.clone(), FREE_PACKAGE_KEY.to_string(), 0, true, position));
            position += 1;
        }
        for (key, price) in &priced_keys {
            rows.push(PurchaseAddon::new(purchase.id.clone(), key.clone(), *price, false, position));
            position += 1;
        }

        match state.purchase_repo.create(&purchase, &rows).await {
            Ok(saved) => {
                created = Some(saved);
                break;
            }
            Err(err) if err.is_unique_violation() => continue,
            Err(err) => return Err(err),
        }
    }
    let purchase = created
        .ok_or(AppError::InternalWithMsg("Could not allocate a unique payment reference".into()))?;

    session.purchase_id = Some(purchase.id.clone());
    advance(&mut session, WizardStep::Done);
    session.touch();
    state.wizard_repo.update(&session).await?;

    info!(
        "Checkout for session {}: purchase {} reference {} total {}",
        session.id, purchase.id, purchase.payment_reference, purchase.total_amount
    );

    // Nothing to collect: settle immediately instead of waiting for a
    // gateway callback that will never come.
    let mut payment_status = PaymentStatus::Pending;
    if purchase.total_amount == 0
        && state.purchase_repo.mark_completed(&purchase.id, Utc::now()).await?
    {
        finalize_completed_purchase(&state, &purchase).await?;
        payment_status = PaymentStatus::Completed;
    }

    let addons = state.addons.summary_view(&keys, token.token_type).await?;

    Ok(Json(CheckoutResponse {
        purchase_id: purchase.id,
        payment_reference: purchase.payment_reference,
        ticket_key,
        ticket_price,
        addons,
        addon_total: check.total,
        total_amount: purchase.total_amount,
        payment_status,
    }))
}
