use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{
    AddonRepository, CapacityConfigRepository, Notifier, PurchaseRepository,
    TicketTypeRepository, TokenRepository, WizardSessionRepository,
};
use crate::domain::services::addons::AddonLedger;
use crate::domain::services::capacity::CapacityTracker;
use crate::domain::services::pricing::PricingEngine;
use crate::domain::services::token_lifecycle::TokenLifecycle;
use crate::infra::notify::http_notifier::HttpNotifier;
use crate::infra::repositories::{
    postgres_addon_repo::PostgresAddonRepo, postgres_capacity_repo::PostgresCapacityRepo,
    postgres_purchase_repo::PostgresPurchaseRepo, postgres_ticket_repo::PostgresTicketRepo,
    postgres_token_repo::PostgresTokenRepo, postgres_wizard_repo::PostgresWizardRepo,
    sqlite_addon_repo::SqliteAddonRepo, sqlite_capacity_repo::SqliteCapacityRepo,
    sqlite_purchase_repo::SqlitePurchaseRepo, sqlite_ticket_repo::SqliteTicketRepo,
    sqlite_token_repo::SqliteTokenRepo, sqlite_wizard_repo::SqliteWizardRepo,
};
use crate::state::AppState;

struct Repos {
    tokens: Arc<dyn TokenRepository>,
    capacity: Arc<dyn CapacityConfigRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    addons: Arc<dyn AddonRepository>,
    tickets: Arc<dyn TicketTypeRepository>,
    wizard: Arc<dyn WizardSessionRepository>,
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Repos {
            tokens: Arc::new(PostgresTokenRepo::new(pool.clone())),
            capacity: Arc::new(PostgresCapacityRepo::new(pool.clone())),
            purchases: Arc::new(PostgresPurchaseRepo::new(pool.clone())),
            addons: Arc::new(PostgresAddonRepo::new(pool.clone())),
            tickets: Arc::new(PostgresTicketRepo::new(pool.clone())),
            wizard: Arc::new(PostgresWizardRepo::new(pool.clone())),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Repos {
            tokens: Arc::new(SqliteTokenRepo::new(pool.clone())),
            capacity: Arc::new(SqliteCapacityRepo::new(pool.clone())),
            purchases: Arc::new(SqlitePurchaseRepo::new(pool.clone())),
            addons: Arc::new(SqliteAddonRepo::new(pool.clone())),
            tickets: Arc::new(SqliteTicketRepo::new(pool.clone())),
            wizard: Arc::new(SqliteWizardRepo::new(pool.clone())),
        }
    };

    assemble_state(config, repos, notifier)
}

fn assemble_state(config: &Config, repos: Repos, notifier: Arc<dyn Notifier>) -> AppState {
    let token_lifecycle = Arc::new(TokenLifecycle::new(
        repos.tokens.clone(),
        repos.purchases.clone(),
        notifier.clone(),
        config.event_end_utc(),
    ));
    let capacity = Arc::new(CapacityTracker::new(
        repos.capacity.clone(),
        repos.purchases.clone(),
        repos.tickets.clone(),
    ));
    let pricing = Arc::new(PricingEngine::new(repos.tickets.clone()));
    let addons = Arc::new(AddonLedger::new(
        repos.addons.clone(),
        repos.purchases.clone(),
        repos.tokens.clone(),
    ));

    AppState {
        config: config.clone(),
        token_repo: repos.tokens,
        capacity_repo: repos.capacity,
        purchase_repo: repos.purchases,
        addon_repo: repos.addons,
        ticket_repo: repos.tickets,
        wizard_repo: repos.wizard,
        notifier,
        token_lifecycle,
        capacity,
        pricing,
        addons,
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
