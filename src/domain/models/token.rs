use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum TokenType {
    Normal,
    FreeTicket,
    PoloOrdered,
    Sponsor,
    Invitation,
}

impl TokenType {
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenType::Normal => "NOR",
            TokenType::FreeTicket => "FTK",
            TokenType::PoloOrdered => "PLO",
            TokenType::Sponsor => "SPO",
            TokenType::Invitation => "INV",
        }
    }

    /// Invitation codes carry a longer suffix (8 chars total vs 6).
    pub fn suffix_len(&self) -> usize {
        match self {
            TokenType::Invitation => 5,
            _ => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Normal => "normal",
            TokenType::FreeTicket => "free_ticket",
            TokenType::PoloOrdered => "polo_ordered",
            TokenType::Sponsor => "sponsor",
            TokenType::Invitation => "invitation",
        }
    }

    /// Free-ticket holders never pick a paid ticket; the wizard skips the
    /// ticket step for them entirely.
    pub fn skips_ticket_selection(&self) -> bool {
        matches!(self, TokenType::FreeTicket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum TokenStatus {
    Active,
    Used,
    Cancelled,
    Expired,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Active => "active",
            TokenStatus::Used => "used",
            TokenStatus::Cancelled => "cancelled",
            TokenStatus::Expired => "expired",
        }
    }
}

/// Attendee data recorded when a token is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Token {
    pub id: String,
    pub code: String,
    pub token_type: TokenType,
    pub parent_id: Option<String>,
    pub status: TokenStatus,
    pub is_used: bool,
    pub used_by_name: Option<String>,
    pub used_by_email: Option<String>,
    pub used_by_phone: Option<String>,
    pub sent_to_name: Option<String>,
    pub sent_to_email: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        code: String,
        created_by: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code,
            token_type,
            parent_id: None,
            status: TokenStatus::Active,
            is_used: false,
            used_by_name: None,
            used_by_email: None,
            used_by_phone: None,
            sent_to_name: None,
            sent_to_email: None,
            cancellation_reason: None,
            cancelled_by: None,
            created_by,
            created_at: Utc::now(),
            used_at: None,
            expires_at,
        }
    }

    pub fn new_invitation(
        parent_id: String,
        code: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let mut token = Token::new(TokenType::Invitation, code, None, expires_at);
        token.parent_id = Some(parent_id);
        token
    }
}

/// Generates a candidate code: 3-letter type prefix plus a random suffix.
/// Each suffix position is a digit or an uppercase letter with equal odds.
/// The format is consumed by printed invitations; do not change it.
pub fn generate_code(token_type: TokenType) -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(8);
    code.push_str(token_type.prefix());
    for _ in 0..token_type.suffix_len() {
        code.push(random_code_char(&mut rng));
    }
    code
}

/// Last-resort code after exhausting collision retries: the timestamp
/// suffix makes it unique at the cost of the fixed length.
pub fn generate_fallback_code(token_type: TokenType) -> String {
    format!("{}{}", generate_code(token_type), Utc::now().timestamp())
}

fn random_code_char<R: Rng>(rng: &mut R) -> char {
    if rng.gen_bool(0.5) {
        rng.gen_range(b'0'..=b'9') as char
    } else {
        rng.gen_range(b'A'..=b'Z') as char
    }
}
