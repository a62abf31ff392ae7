use crate::domain::models::purchase::Purchase;
use crate::domain::models::token::Token;
use crate::domain::ports::Notifier;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Posts structured notification events to the external notify service,
/// which owns template rendering and delivery. The core never formats HTML.
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpNotifier {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_token,
        }
    }

    async fn post_event(&self, payload: &EventPayload) -> Result<(), AppError> {
        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notify service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notify service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct EventPayload {
    event: &'static str,
    recipient: String,
    data: Value,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn token_cancelled(&self, token: &Token, recipient_email: &str, reason: &str) -> Result<(), AppError> {
        let payload = EventPayload {
            event: "token_cancelled",
            recipient: recipient_email.to_string(),
            data: serde_json::json!({
                "code": token.code,
                "token_type": token.token_type.as_str(),
                "reason": reason,
            }),
        };
        self.post_event(&payload).await
    }

    async fn purchase_confirmed(&self, purchase: &Purchase, invitation_codes: &[String]) -> Result<(), AppError> {
        let payload = EventPayload {
            event: "purchase_confirmed",
            recipient: purchase.attendee_email.clone(),
            data: serde_json::json!({
                "payment_reference": purchase.payment_reference,
                "attendee_name": purchase.attendee_name,
                "ticket_key": purchase.ticket_key,
                "total_amount": purchase.total_amount,
                "total_drink_count": purchase.total_drink_count,
                "invitation_codes": invitation_codes,
            }),
        };
        self.post_event(&payload).await
    }
}
