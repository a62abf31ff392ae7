use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{addons, booking, capacity, health, payments, purchases, tickets, tokens};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Public Booking Wizard
        .route("/api/v1/booking/start", post(booking::start_booking))
        .route("/api/v1/booking/{session_id}", get(booking::get_session))
        .route("/api/v1/booking/{session_id}/attendee", put(booking::set_attendee))
        .route("/api/v1/booking/{session_id}/ticket", put(booking::select_ticket))
        .route("/api/v1/booking/{session_id}/addons", put(booking::select_addons))
        .route("/api/v1/booking/{session_id}/checkout", post(booking::checkout))

        // Public Catalogue & Status
        .route("/api/v1/tokens/{code}/validate", get(tokens::validate_token))
        .route("/api/v1/capacity", get(capacity::get_capacity))
        .route("/api/v1/addons", get(addons::list_addons))

        // Payment Gateway Callbacks
        .route("/api/v1/payments/{reference}/complete", post(payments::complete_payment))
        .route("/api/v1/payments/{reference}/fail", post(payments::fail_payment))

        // Admin - Tokens
        .route("/api/v1/admin/tokens/generate", post(tokens::generate_tokens))
        .route("/api/v1/admin/tokens", get(tokens::list_tokens))
        .route("/api/v1/admin/tokens/{token_id}", get(tokens::get_token))
        .route("/api/v1/admin/tokens/{token_id}/invitations", get(tokens::list_invitations))
        .route("/api/v1/admin/tokens/{token_id}/cancel", post(tokens::cancel_token))
        .route("/api/v1/admin/tokens/{token_id}/recipient", put(tokens::update_recipient))

        // Admin - Capacity
        .route("/api/v1/admin/capacity", put(capacity::update_capacity))
        .route("/api/v1/admin/capacity/history", get(capacity::capacity_history))
        .route("/api/v1/admin/capacity/rollback/{config_id}", post(capacity::rollback_capacity))

        // Admin - Catalogue
        .route("/api/v1/admin/addons", get(addons::list_all_addons).post(addons::create_addon))
        .route("/api/v1/admin/addons/{addon_id}", put(addons::update_addon).delete(addons::disable_addon))
        .route("/api/v1/admin/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/api/v1/admin/tickets/{ticket_id}", put(tickets::update_ticket))

        // Admin - Purchases
        .route("/api/v1/admin/purchases", get(purchases::list_purchases))
        .route("/api/v1/admin/purchases/{purchase_id}", get(purchases::get_purchase).put(purchases::update_purchase))
        .route("/api/v1/admin/purchases/{purchase_id}/drinks", get(purchases::purchase_drinks))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
