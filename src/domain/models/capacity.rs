use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Capacity-based pricing bracket. Each tier's threshold is its upper
/// bound on the completed-purchase count. Declaration order is sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    EarlyBird,
    LateBird,
    VeryLateBird,
    Final,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::EarlyBird => "early_bird",
            Tier::LateBird => "late_bird",
            Tier::VeryLateBird => "very_late_bird",
            Tier::Final => "final",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::EarlyBird => "Early Bird",
            Tier::LateBird => "Late Bird",
            Tier::VeryLateBird => "Very Late Bird",
            Tier::Final => "Final",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CapacityConfig {
    pub id: String,
    pub target_capacity: i64,
    pub max_capacity: i64,
    pub alert_threshold: i64,
    pub early_bird_threshold: i64,
    pub late_bird_threshold: i64,
    pub very_late_bird_threshold: i64,
    pub is_active: bool,
    pub change_note: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CapacityConfig {
    pub fn tier_for_count(&self, count: i64) -> Tier {
        if count < self.early_bird_threshold {
            Tier::EarlyBird
        } else if count < self.late_bird_threshold {
            Tier::LateBird
        } else if count < self.very_late_bird_threshold {
            Tier::VeryLateBird
        } else {
            Tier::Final
        }
    }

    /// Count of tickets that must sell before the given tier opens.
    pub fn tier_opens_after(&self, tier: Tier) -> i64 {
        match tier {
            Tier::EarlyBird => 0,
            Tier::LateBird => self.early_bird_threshold,
            Tier::VeryLateBird => self.late_bird_threshold,
            Tier::Final => self.very_late_bird_threshold,
        }
    }
}

/// Admin-supplied settings for a config update. Every update produces a
/// fresh history row; the struct never mutates an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySettings {
    pub target_capacity: i64,
    pub max_capacity: i64,
    pub alert_threshold: i64,
    pub early_bird_threshold: i64,
    pub late_bird_threshold: i64,
    pub very_late_bird_threshold: i64,
}

impl CapacitySettings {
    /// Bounds checks, reported as a full list rather than first-failure.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.target_capacity < 100 {
            errors.push("Target capacity must be at least 100".to_string());
        }
        if self.max_capacity < 200 {
            errors.push("Maximum capacity must be at least 200".to_string());
        }
        if self.max_capacity < self.target_capacity {
            errors.push("Maximum capacity cannot be below target capacity".to_string());
        }
        if self.alert_threshold < 50 || self.alert_threshold > self.target_capacity {
            errors.push("Alert threshold must be between 50 and the target capacity".to_string());
        }
        errors
    }

    /// Tier bounds must strictly increase. A later threshold that fails to
    /// clear its predecessor gets pushed to predecessor + 50.
    pub fn normalize_thresholds(&mut self) {
        if self.late_bird_threshold <= self.early_bird_threshold {
            self.late_bird_threshold = self.early_bird_threshold + 50;
        }
        if self.very_late_bird_threshold <= self.late_bird_threshold {
            self.very_late_bird_threshold = self.late_bird_threshold + 50;
        }
    }

    /// Human-readable field-by-field diff against the config being replaced.
    pub fn change_note(&self, previous: Option<&CapacityConfig>) -> String {
        let Some(prev) = previous else {
            return "Initial configuration".to_string();
        };

        let fields = [
            ("target", prev.target_capacity, self.target_capacity),
            ("max", prev.max_capacity, self.max_capacity),
            ("alert", prev.alert_threshold, self.alert_threshold),
            ("early_bird", prev.early_bird_threshold, self.early_bird_threshold),
            ("late_bird", prev.late_bird_threshold, self.late_bird_threshold),
            ("very_late_bird", prev.very_late_bird_threshold, self.very_late_bird_threshold),
        ];

        let changes: Vec<String> = fields
            .iter()
            .filter(|(_, old, new)| old != new)
            .map(|(name, old, new)| format!("{}: {} -> {}", name, old, new))
            .collect();

        if changes.is_empty() {
            "No changes".to_string()
        } else {
            changes.join(", ")
        }
    }

    /// Settings as stored on an existing row, used by rollback to replay a
    /// historical configuration as a fresh one.
    pub fn from_config(config: &CapacityConfig) -> Self {
        Self {
            target_capacity: config.target_capacity,
            max_capacity: config.max_capacity,
            alert_threshold: config.alert_threshold,
            early_bird_threshold: config.early_bird_threshold,
            late_bird_threshold: config.late_bird_threshold,
            very_late_bird_threshold: config.very_late_bird_threshold,
        }
    }

    pub fn into_config(self, change_note: String, created_by: Option<String>) -> CapacityConfig {
        CapacityConfig {
            id: Uuid::new_v4().to_string(),
            target_capacity: self.target_capacity,
            max_capacity: self.max_capacity,
            alert_threshold: self.alert_threshold,
            early_bird_threshold: self.early_bird_threshold,
            late_bird_threshold: self.late_bird_threshold,
            very_late_bird_threshold: self.very_late_bird_threshold,
            is_active: true,
            change_note: Some(change_note),
            created_by,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityStatus {
    pub current: i64,
    pub target: i64,
    pub max: i64,
    pub remaining: i64,
    pub percent_used: f64,
    pub near_capacity: bool,
    pub at_capacity: bool,
}

impl CapacityStatus {
    pub fn derive(current: i64, config: &CapacityConfig) -> Self {
        let target = config.target_capacity;
        let max = config.max_capacity;
        let percent_used = if target > 0 {
            (current as f64 / target as f64) * 100.0
        } else {
            0.0
        };

        Self {
            current,
            target,
            max,
            remaining: (max - current).max(0),
            percent_used,
            near_capacity: current * 10 >= target * 9,
            at_capacity: current >= max,
        }
    }
}
