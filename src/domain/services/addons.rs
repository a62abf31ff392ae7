use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::models::addon::{Addon, PurchaseAddon};
use crate::domain::models::token::TokenType;
use crate::domain::ports::{AddonRepository, PurchaseRepository, TokenRepository};
use crate::error::AppError;

/// Conditionally-free package: costs nothing for polo_ordered holders, its
/// table price for everyone else, and always pours exactly one drink.
pub const FREE_PACKAGE_KEY: &str = "afterpart_package_0";

/// This package's drink allotment was reduced mid-sale; purchases made
/// before the cutoff keep the old allotment.
pub const GRANDFATHERED_PACKAGE_KEY: &str = "afterparty_package_2";
const GRANDFATHERED_DRINKS_BEFORE: i64 = 4;
const GRANDFATHERED_DRINKS_AFTER: i64 = 3;

fn grandfather_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
}

pub fn charged_price(addon: &Addon, token_type: TokenType) -> i64 {
    if addon.key == FREE_PACKAGE_KEY && token_type == TokenType::PoloOrdered {
        0
    } else {
        addon.price
    }
}

#[derive(Debug)]
pub struct SelectionCheck {
    pub valid: bool,
    pub errors: Vec<String>,
    pub total: i64,
}

/// Validates a selection against the catalogue. At most one addon may be
/// selected, except a polo_ordered holder pairing the free package with
/// exactly one paid addon. Unknown keys are each reported without aborting
/// the rest; disabled addons price at zero like disabled tickets.
pub fn check_selection(
    keys: &[String],
    catalogue: &[Addon],
    token_type: TokenType,
) -> SelectionCheck {
    let mut errors = Vec::new();

    if keys.len() > 1 {
        let polo_pair = token_type == TokenType::PoloOrdered
            && keys.len() == 2
            && keys.iter().any(|k| k == FREE_PACKAGE_KEY)
            && keys.iter().filter(|k| k.as_str() != FREE_PACKAGE_KEY).count() == 1;
        if !polo_pair {
            errors.push("Only one add-on can be selected at a time".to_string());
        }
    }

    let mut total = 0;
    for key in keys {
        match catalogue.iter().find(|a| &a.key == key) {
            Some(addon) if addon.is_enabled => total += charged_price(addon, token_type),
            Some(_) => {}
            None => errors.push(format!("Unknown add-on: {}", key)),
        }
    }

    SelectionCheck { valid: errors.is_empty(), errors, total }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonSummary {
    pub key: String,
    pub name: String,
    pub price: i64,
    pub is_free: bool,
}

/// Billing summary of a selection. A polo_ordered holder who also picked a
/// paid addon does not see the free package line; only one addon should
/// ever appear billed.
pub fn summarize_selection(
    keys: &[String],
    catalogue: &[Addon],
    token_type: TokenType,
) -> Vec<AddonSummary> {
    let hide_free = token_type == TokenType::PoloOrdered
        && keys.iter().any(|k| {
            k != FREE_PACKAGE_KEY && catalogue.iter().any(|a| &a.key == k)
        });

    let mut summary = Vec::new();
    for key in keys {
        let Some(addon) = catalogue.iter().find(|a| &a.key == key) else {
            continue;
        };
        if addon.key == FREE_PACKAGE_KEY && hide_free {
            continue;
        }
        let price = charged_price(addon, token_type);
        summary.push(AddonSummary {
            key: addon.key.clone(),
            name: addon.name.clone(),
            price,
            is_free: price == 0 && addon.key == FREE_PACKAGE_KEY,
        });
    }
    summary
}

/// Drink entitlement reads a single addon row, never a sum: the newest row
/// wins, and for polo_ordered the newest PAID row wins whenever one exists.
/// `rows` must be ordered newest first. This single-row rule is the
/// documented business behavior; do not "fix" it to a sum.
pub fn drink_count_for_rows(
    rows: &[PurchaseAddon],
    catalogue: &[Addon],
    token_type: TokenType,
    purchased_at: DateTime<Utc>,
) -> i64 {
    let relevant = if token_type == TokenType::PoloOrdered {
        rows.iter().find(|r| !r.is_free).or_else(|| rows.first())
    } else {
        rows.first()
    };
    let Some(row) = relevant else {
        return 0;
    };

    match row.addon_key.as_str() {
        FREE_PACKAGE_KEY => 1,
        GRANDFATHERED_PACKAGE_KEY => {
            if purchased_at < grandfather_cutoff() {
                GRANDFATHERED_DRINKS_BEFORE
            } else {
                GRANDFATHERED_DRINKS_AFTER
            }
        }
        key => catalogue
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.drink_count)
            .unwrap_or(0),
    }
}

pub struct AddonLedger {
    addons: Arc<dyn AddonRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl AddonLedger {
    pub fn new(
        addons: Arc<dyn AddonRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self { addons, purchases, tokens }
    }

    pub async fn validate_selection(
        &self,
        keys: &[String],
        token_type: TokenType,
    ) -> Result<SelectionCheck, AppError> {
        let catalogue = self.addons.list(true).await?;
        Ok(check_selection(keys, &catalogue, token_type))
    }

    /// polo_ordered holders default to the free package; everyone else to
    /// the first enabled addon by sort order.
    pub async fn default_selection(&self, token_type: TokenType) -> Result<Vec<String>, AppError> {
        if token_type == TokenType::PoloOrdered {
            return Ok(vec![FREE_PACKAGE_KEY.to_string()]);
        }
        let catalogue = self.addons.list(false).await?;
        Ok(catalogue.first().map(|a| vec![a.key.clone()]).unwrap_or_default())
    }

    pub async fn compute_total(
        &self,
        keys: &[String],
        token_type: TokenType,
    ) -> Result<i64, AppError> {
        Ok(self.validate_selection(keys, token_type).await?.total)
    }

    pub async fn summary_view(
        &self,
        keys: &[String],
        token_type: TokenType,
    ) -> Result<Vec<AddonSummary>, AppError> {
        let catalogue = self.addons.list(true).await?;
        Ok(summarize_selection(keys, &catalogue, token_type))
    }

    /// Drink count for a persisted purchase, from its newest relevant addon
    /// row.
    pub async fn drink_count(&self, purchase_id: &str) -> Result<i64, AppError> {
        let Some(purchase) = self.purchases.find_by_id(purchase_id).await? else {
            return Err(AppError::NotFound(format!("Purchase {} not found", purchase_id)));
        };
        let rows = self.purchases.list_addons(purchase_id).await?;
        if rows.is_empty() {
            return Ok(0);
        }

        let token_type = match self.tokens.find_by_id(&purchase.token_id).await? {
            Some(token) => token.token_type,
            None => TokenType::Normal,
        };
        let catalogue = self.addons.list(true).await?;
        Ok(drink_count_for_rows(&rows, &catalogue, token_type, purchase.created_at))
    }
}
