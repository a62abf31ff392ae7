use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::models::capacity::CapacityStatus;
use crate::domain::models::token::{self, Token, TokenStatus, TokenType, TokenUser};
use crate::domain::ports::{Notifier, PurchaseRepository, TokenRepository};
use crate::error::AppError;

const MAX_CODE_ATTEMPTS: usize = 10;

/// Unused tokens released per capacity sweep, at most.
pub const AUTO_RELEASE_LIMIT: i64 = 50;
const AUTO_RELEASE_REASON: &str = "Automatically released: event capacity almost reached";
const AUTO_RELEASE_ACTOR: &str = "system";

/// Invitation tokens spawned for each completed purchase.
pub const INVITATIONS_PER_PURCHASE: u32 = 5;

/// Outcome of a code check. `valid=false` always carries a reason; the
/// flags tell the caller which terminal state the token is in.
#[derive(Debug)]
pub struct TokenValidation {
    pub valid: bool,
    pub token: Option<Token>,
    pub reason: Option<String>,
    pub cancelled: bool,
    pub expired: bool,
    pub used: bool,
}

impl TokenValidation {
    fn ok(token: Token) -> Self {
        Self {
            valid: true,
            token: Some(token),
            reason: None,
            cancelled: false,
            expired: false,
            used: false,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            token: None,
            reason: Some(reason.into()),
            cancelled: false,
            expired: false,
            used: false,
        }
    }
}

pub struct TokenLifecycle {
    tokens: Arc<dyn TokenRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    notifier: Arc<dyn Notifier>,
    event_end: DateTime<Utc>,
}

impl TokenLifecycle {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        notifier: Arc<dyn Notifier>,
        event_end: DateTime<Utc>,
    ) -> Self {
        Self { tokens, purchases, notifier, event_end }
    }

    /// Mints `count` tokens of the given type. Individual failures are
    /// logged and skipped, so the result may be shorter than requested;
    /// callers inspect the length.
    pub async fn generate(
        &self,
        token_type: TokenType,
        count: u32,
        created_by: Option<&str>,
    ) -> Vec<Token> {
        let mut minted = Vec::with_capacity(count as usize);
        for _ in 0..count {
            match self.create_unique(token_type, None, created_by).await {
                Ok(created) => minted.push(created),
                Err(err) => {
                    warn!(%err, token_type = token_type.as_str(), "token generation failed, skipping item");
                }
            }
        }
        info!(
            token_type = token_type.as_str(),
            requested = count,
            minted = minted.len(),
            "generated tokens"
        );
        minted
    }

    /// Spawns invitation tokens chained to the purchasing token. Invoked
    /// once per completed purchase; the purchase-completion CAS guarantees
    /// the once.
    pub async fn generate_invitations(&self, parent_token_id: &str, count: u32) -> Vec<Token> {
        let mut minted = Vec::with_capacity(count as usize);
        for _ in 0..count {
            match self
                .create_unique(TokenType::Invitation, Some(parent_token_id), None)
                .await
            {
                Ok(created) => minted.push(created),
                Err(err) => {
                    warn!(%err, parent_token_id, "invitation generation failed, skipping item");
                }
            }
        }
        minted
    }

    async fn create_unique(
        &self,
        token_type: TokenType,
        parent_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Result<Token, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = token::generate_code(token_type);
            if self.tokens.code_exists(&code).await? {
                continue;
            }
            match self.tokens.create(&self.build(token_type, code, parent_id, created_by)).await {
                Ok(created) => return Ok(created),
                // Lost the insert race against a concurrent generation.
                Err(err) if err.is_unique_violation() => continue,
                Err(err) => return Err(err),
            }
        }
        let code = token::generate_fallback_code(token_type);
        self.tokens.create(&self.build(token_type, code, parent_id, created_by)).await
    }

    fn build(
        &self,
        token_type: TokenType,
        code: String,
        parent_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Token {
        match parent_id {
            Some(parent) => Token::new_invitation(parent.to_string(), code, self.event_end),
            None => Token::new(token_type, code, created_by.map(str::to_string), self.event_end),
        }
    }

    /// Checks a presented code. Side-effect-free except for lazy expiry of
    /// an active token whose `expires_at` has passed.
    pub async fn validate(&self, code: &str) -> Result<TokenValidation, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(TokenValidation::invalid("Please enter your access key"));
        }

        let Some(token) = self.tokens.find_by_code(code).await? else {
            return Ok(TokenValidation::invalid("Invalid access key"));
        };

        if token.status == TokenStatus::Cancelled {
            let reason = token
                .cancellation_reason
                .clone()
                .unwrap_or_else(|| "This key has been cancelled".to_string());
            let mut result = TokenValidation::invalid(reason);
            result.cancelled = true;
            result.token = Some(token);
            return Ok(result);
        }

        if token.status == TokenStatus::Used || token.is_used {
            let mut result = TokenValidation::invalid("This key has already been used");
            result.used = true;
            result.token = Some(token);
            return Ok(result);
        }

        if token.status == TokenStatus::Expired {
            let mut result = TokenValidation::invalid("This key has expired");
            result.expired = true;
            result.token = Some(token);
            return Ok(result);
        }

        if token.expires_at < Utc::now() {
            self.tokens.mark_expired(&token.id).await?;
            info!(token_id = %token.id, code = %token.code, "token lazily expired on validation");
            let mut result = TokenValidation::invalid("This key has expired");
            result.expired = true;
            result.token = Some(token);
            return Ok(result);
        }

        Ok(TokenValidation::ok(token))
    }

    /// Consumes a token after payment confirmation. False when the token is
    /// unknown, already used, or no longer active; the underlying update is
    /// a compare-and-set, so concurrent callbacks cannot both succeed.
    pub async fn use_token(&self, token_id: &str, user: &TokenUser) -> Result<bool, AppError> {
        let consumed = self.tokens.mark_used(token_id, user, Utc::now()).await?;
        if consumed {
            info!(token_id, attendee = %user.email, "token consumed");
        }
        Ok(consumed)
    }

    /// Cancels an active token. Used tokens are immutable and report false.
    /// A successful cancellation emits a notification when a recipient
    /// email can be resolved.
    pub async fn cancel(&self, token_id: &str, reason: &str, actor: &str) -> Result<bool, AppError> {
        let Some(token) = self.tokens.find_by_id(token_id).await? else {
            return Err(AppError::NotFound(format!("Token {} not found", token_id)));
        };

        if token.is_used {
            return Ok(false);
        }

        let cancelled = self.tokens.mark_cancelled(token_id, reason, actor).await?;
        if cancelled {
            info!(token_id, code = %token.code, actor, "token cancelled");
            self.notify_cancellation(&token, reason).await;
        }
        Ok(cancelled)
    }

    /// Backpressure near the capacity target: sheds up to
    /// [`AUTO_RELEASE_LIMIT`] unused active tokens, non-normal types first,
    /// oldest first. Safe to re-run; tokens cancelled by a racing sweep
    /// fail the CAS and are skipped.
    pub async fn check_capacity_and_auto_cancel(
        &self,
        status: &CapacityStatus,
    ) -> Result<u64, AppError> {
        if !status.near_capacity {
            return Ok(0);
        }

        let candidates = self.tokens.find_unused_active(AUTO_RELEASE_LIMIT).await?;
        let mut released = 0u64;
        for candidate in candidates {
            match self
                .tokens
                .mark_cancelled(&candidate.id, AUTO_RELEASE_REASON, AUTO_RELEASE_ACTOR)
                .await
            {
                Ok(true) => {
                    released += 1;
                    self.notify_cancellation(&candidate, AUTO_RELEASE_REASON).await;
                }
                Ok(false) => {}
                Err(err) => warn!(%err, token_id = %candidate.id, "auto-release failed"),
            }
        }

        if released > 0 {
            warn!(
                released,
                current = status.current,
                target = status.target,
                "released unused tokens near capacity"
            );
        }
        Ok(released)
    }

    /// Bulk lazy-expiry of active tokens past their deadline.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        let expired = self.tokens.expire_overdue(Utc::now()).await?;
        if expired > 0 {
            info!(expired, "expired overdue tokens");
        }
        Ok(expired)
    }

    /// Resolves the notification recipient: the purchase attendee email
    /// when the token ever reached a purchase, the sent-to email otherwise,
    /// nobody when neither exists. Notification failures never propagate.
    async fn notify_cancellation(&self, token: &Token, reason: &str) {
        let email = match self.purchases.find_by_token(&token.id).await {
            Ok(Some(purchase)) if !purchase.attendee_email.is_empty() => purchase.attendee_email,
            Ok(_) => match token.sent_to_email.clone() {
                Some(email) => email,
                None => return,
            },
            Err(err) => {
                warn!(%err, token_id = %token.id, "purchase lookup for cancellation notice failed");
                return;
            }
        };

        if let Err(err) = self.notifier.token_cancelled(token, &email, reason).await {
            warn!(%err, token_id = %token.id, "cancellation notification failed");
        }
    }
}
