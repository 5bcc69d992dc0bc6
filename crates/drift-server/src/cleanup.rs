use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use drift_db::Database;

/// Background task that prunes expired rooms and files.
///
/// Runs on an interval driven by wall-clock time alone, fully decoupled from
/// relay traffic. Files are swept first so their message references clear
/// before any room cascade. A failed pass is logged and retried on the next
/// tick; partial progress is fine since both sweeps are idempotent.
pub async fn run_sweep_loop(db: Arc<Database>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_once(&db).await {
            Ok((files, rooms)) => {
                if files > 0 || rooms > 0 {
                    info!("sweep: pruned {} expired files, {} expired rooms", files, rooms);
                }
            }
            Err(e) => {
                warn!("sweep error: {} (retrying next tick)", e);
            }
        }
    }
}

async fn sweep_once(db: &Arc<Database>) -> anyhow::Result<(usize, usize)> {
    let db = db.clone();
    let counts = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let files = db.sweep_expired_files(now)?;
        let rooms = db.sweep_expired_rooms(now)?;
        Ok::<_, anyhow::Error>((files, rooms))
    })
    .await??;

    Ok(counts)
}
