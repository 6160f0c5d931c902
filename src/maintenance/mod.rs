use tokio::time::{Duration, sleep};
use tracing::{error, info};

use crate::{store::StoreResult, web::AppState};

const CLEANUP_INTERVAL_MINUTES: u64 = 15;

pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(CLEANUP_INTERVAL_MINUTES * 60);
        loop {
            if let Err(err) = run_cleanup_cycle(&state).await {
                error!(?err, "session cleanup cycle failed");
            }
            sleep(interval).await;
        }
    });
}

async fn run_cleanup_cycle(state: &AppState) -> StoreResult<u64> {
    let purged = state.auth().purge_expired_sessions().await?;
    if purged > 0 {
        info!(purged, "expired sessions removed");
    }
    Ok(purged)
}
