use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use std::sync::Arc;

/// Guard for `/api/v1/admin/*` routes. Requires the `X-Admin-Key` header
/// to match the configured admin API key.
pub struct AdminKey;

impl<S> FromRequestParts<S> for AdminKey
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let presented = parts
            .headers
            .get("X-Admin-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if presented != app_state.config.admin_api_key {
            return Err(StatusCode::FORBIDDEN);
        }

        Ok(AdminKey)
    }
}

/// Guard for payment gateway callbacks. Requires the `X-Gateway-Key`
/// header to match the configured webhook key.
pub struct GatewayKey;

impl<S> FromRequestParts<S> for GatewayKey
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let presented = parts
            .headers
            .get("X-Gateway-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if presented != app_state.config.gateway_webhook_key {
            return Err(StatusCode::FORBIDDEN);
        }

        Ok(GatewayKey)
    }
}
