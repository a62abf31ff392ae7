use ticketing_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::repositories::{
        sqlite_addon_repo::SqliteAddonRepo,
        sqlite_capacity_repo::SqliteCapacityRepo,
        sqlite_purchase_repo::SqlitePurchaseRepo,
        sqlite_ticket_repo::SqliteTicketRepo,
        sqlite_token_repo::SqliteTokenRepo,
        sqlite_wizard_repo::SqliteWizardRepo,
    },
    domain::models::purchase::Purchase,
    domain::models::token::Token,
    domain::ports::Notifier,
    domain::services::addons::AddonLedger,
    domain::services::capacity::CapacityTracker,
    domain::services::pricing::PricingEngine,
    domain::services::token_lifecycle::TokenLifecycle,
    background::start_background_worker,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use axum::Router;
use async_trait::async_trait;
use chrono::NaiveDate;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const GATEWAY_KEY: &str = "test-gateway-key";

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum NotifyEvent {
    TokenCancelled {
        code: String,
        recipient: String,
        reason: String,
    },
    PurchaseConfirmed {
        reference: String,
        recipient: String,
        invitation_codes: Vec<String>,
    },
}

pub struct MockNotifier {
    pub events: Arc<Mutex<Vec<NotifyEvent>>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn token_cancelled(
        &self,
        token: &Token,
        recipient_email: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        self.events.lock().unwrap().push(NotifyEvent::TokenCancelled {
            code: token.code.clone(),
            recipient: recipient_email.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn purchase_confirmed(
        &self,
        purchase: &Purchase,
        invitation_codes: &[String],
    ) -> Result<(), AppError> {
        self.events.lock().unwrap().push(NotifyEvent::PurchaseConfirmed {
            reference: purchase.payment_reference.clone(),
            recipient: purchase.attendee_email.clone(),
            invitation_codes: invitation_codes.to_vec(),
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub notifications: Arc<Mutex<Vec<NotifyEvent>>>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
            admin_api_key: ADMIN_KEY.to_string(),
            gateway_webhook_key: GATEWAY_KEY.to_string(),
            event_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            event_timezone: "UTC".to_string(),
        };

        let notifications = Arc::new(Mutex::new(Vec::new()));
        let notifier: Arc<dyn Notifier> = Arc::new(MockNotifier {
            events: notifications.clone(),
        });

        let token_repo = Arc::new(SqliteTokenRepo::new(pool.clone()));
        let capacity_repo = Arc::new(SqliteCapacityRepo::new(pool.clone()));
        let purchase_repo = Arc::new(SqlitePurchaseRepo::new(pool.clone()));
        let addon_repo = Arc::new(SqliteAddonRepo::new(pool.clone()));
        let ticket_repo = Arc::new(SqliteTicketRepo::new(pool.clone()));
        let wizard_repo = Arc::new(SqliteWizardRepo::new(pool.clone()));

        let token_lifecycle = Arc::new(TokenLifecycle::new(
            token_repo.clone(),
            purchase_repo.clone(),
            notifier.clone(),
            config.event_end_utc(),
        ));
        let capacity = Arc::new(CapacityTracker::new(
            capacity_repo.clone(),
            purchase_repo.clone(),
            ticket_repo.clone(),
        ));
        let pricing = Arc::new(PricingEngine::new(ticket_repo.clone()));
        let addons = Arc::new(AddonLedger::new(
            addon_repo.clone(),
            purchase_repo.clone(),
            token_repo.clone(),
        ));

        let state = Arc::new(AppState {
            config: config.clone(),
            token_repo,
            capacity_repo,
            purchase_repo,
            addon_repo,
            ticket_repo,
            wizard_repo,
            notifier,
            token_lifecycle,
            capacity,
            pricing,
            addons,
        });

        // Start Background Worker
        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            notifications,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
