use ticketing_backend::{
    domain::models::purchase::{NewPurchaseParams, Purchase},
    domain::models::token::{Token, TokenType},
    domain::ports::{Notifier, PurchaseRepository, TokenRepository},
    domain::services::token_lifecycle::TokenLifecycle,
    error::AppError,
    infra::repositories::postgres_purchase_repo::PostgresPurchaseRepo,
    infra::repositories::postgres_token_repo::PostgresTokenRepo,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::ConnectOptions;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;

struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn token_cancelled(&self, _: &Token, _: &str, _: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn purchase_confirmed(&self, _: &Purchase, _: &[String]) -> Result<(), AppError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_concurrent_generation_and_completion_races() {
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for concurrency test");
    if !db_url.starts_with("postgres") {
        println!("Skipping concurrency test (not targeting Postgres)");
        return;
    }

    let opts = PgConnectOptions::from_str(&db_url)
        .unwrap()
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect_with(opts)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("DELETE FROM purchase_addons").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM purchases").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM tokens").execute(&pool).await.unwrap();

    let token_repo = Arc::new(PostgresTokenRepo::new(pool.clone()));
    let purchase_repo = Arc::new(PostgresPurchaseRepo::new(pool.clone()));
    let lifecycle = Arc::new(TokenLifecycle::new(
        token_repo.clone(),
        purchase_repo.clone(),
        Arc::new(NoopNotifier),
        Utc::now() + Duration::days(365),
    ));

    // 1. Many admins minting batches at once must never collide on a code.
    let worker_count = 10;
    let per_worker = 30u32;
    let mut set = JoinSet::new();

    for i in 0..worker_count {
        let lifecycle_clone = lifecycle.clone();
        set.spawn(async move {
            let minted = lifecycle_clone.generate(TokenType::Normal, per_worker, None).await;
            println!("Worker {} minted {} tokens", i, minted.len());
            minted.into_iter().map(|t| t.code).collect::<Vec<_>>()
        });
    }

    let mut all_codes = Vec::new();
    while let Some(res) = set.join_next().await {
        all_codes.extend(res.unwrap());
    }

    let unique_codes: HashSet<String> = all_codes.iter().cloned().collect();

    println!("Total minted: {}", all_codes.len());
    println!("Unique codes: {}", unique_codes.len());

    assert_eq!(
        all_codes.len(),
        (worker_count * per_worker) as usize,
        "Some generations were dropped"
    );
    assert_eq!(
        unique_codes.len(),
        all_codes.len(),
        "Duplicate codes minted! Race condition exists."
    );

    // 2. Duplicate gateway callbacks: exactly one completion may win.
    let token = token_repo
        .create(&Token::new(
            TokenType::Normal,
            "NORRACE".to_string(),
            None,
            Utc::now() + Duration::days(365),
        ))
        .await
        .unwrap();

    let purchase = purchase_repo
        .create(
            &Purchase::new(NewPurchaseParams {
                token_id: token.id.clone(),
                attendee_name: "Amal".to_string(),
                attendee_email: "amal@example.com".to_string(),
                attendee_phone: "0771234567".to_string(),
                ticket_key: Some("general_early".to_string()),
                ticket_price: 3500,
                addon_total: 0,
            }),
            &[],
        )
        .await
        .unwrap();

    let mut callbacks = JoinSet::new();
    for _ in 0..8 {
        let repo_clone = purchase_repo.clone();
        let purchase_id = purchase.id.clone();
        callbacks.spawn(async move {
            repo_clone.mark_completed(&purchase_id, Utc::now()).await.unwrap()
        });
    }

    let mut wins = 0;
    while let Some(res) = callbacks.join_next().await {
        if res.unwrap() {
            wins += 1;
        }
    }

    assert_eq!(wins, 1, "Exactly one completion callback must win the CAS");

    sqlx::query("DELETE FROM purchase_addons").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM purchases").execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM tokens").execute(&pool).await.unwrap();
}
