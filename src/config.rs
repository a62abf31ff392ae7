use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub notify_service_url: String,
    pub notify_service_token: String,
    pub admin_api_key: String,
    pub gateway_webhook_key: String,
    pub event_date: NaiveDate,
    pub event_timezone: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            notify_service_url: env::var("NOTIFY_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/notify".to_string()),
            notify_service_token: env::var("NOTIFY_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            admin_api_key: env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set"),
            gateway_webhook_key: env::var("GATEWAY_WEBHOOK_KEY").expect("GATEWAY_WEBHOOK_KEY must be set"),
            event_date: env::var("EVENT_DATE")
                .unwrap_or_else(|_| "2025-09-06".to_string())
                .parse()
                .expect("EVENT_DATE must be YYYY-MM-DD"),
            event_timezone: env::var("EVENT_TIMEZONE").unwrap_or_else(|_| "Asia/Colombo".to_string()),
        }
    }

    /// Tokens stay redeemable until the end of the event day in the event's
    /// local timezone.
    pub fn event_end_utc(&self) -> DateTime<Utc> {
        let tz: Tz = self.event_timezone.parse().unwrap_or(chrono_tz::UTC);
        let end_of_day = self.event_date.and_hms_opt(23, 59, 59).unwrap();
        tz.from_local_datetime(&end_of_day)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&end_of_day))
    }
}
