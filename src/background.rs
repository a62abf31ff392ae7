use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;

const CYCLE_SECONDS: u64 = 60;

/// Periodic maintenance: expires overdue tokens, releases unused ones when
/// the event approaches capacity, and drops stale booking sessions. Every
/// step is independent; one failing never stops the others.
pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background maintenance worker...");

    loop {
        run_cycle(&state)
            .instrument(info_span!("maintenance_cycle"))
            .await;
        sleep(Duration::from_secs(CYCLE_SECONDS)).await;
    }
}

async fn run_cycle(state: &Arc<AppState>) {
    match state.token_lifecycle.sweep_expired().await {
        Ok(0) => {}
        Ok(n) => info!("Expired {} overdue tokens", n),
        Err(e) => error!("Token expiry sweep failed: {:?}", e),
    }

    match state.capacity.status().await {
        Ok(status) => match state.token_lifecycle.check_capacity_and_auto_cancel(&status).await {
            Ok(0) => {}
            Ok(n) => info!("Released {} unused tokens near capacity", n),
            Err(e) => error!("Capacity auto-release failed: {:?}", e),
        },
        Err(e) => error!("Capacity status check failed: {:?}", e),
    }

    match state.wizard_repo.delete_expired(Utc::now()).await {
        Ok(0) => {}
        Ok(n) => info!("Dropped {} expired booking sessions", n),
        Err(e) => error!("Session cleanup failed: {:?}", e),
    }
}
