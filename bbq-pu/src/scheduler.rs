//! Scheduled feed sync
//!
//! Runs the lenient feed sync in replace mode on a fixed interval. A tick
//! that finds the lease taken after its fetch is skipped, not queued.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::pipeline::{sync_from_feed, PipelineError};
use crate::reconcile::{ReconcileMode, ReconcileSummary};
use crate::AppState;

/// Run one scheduled sync now
///
/// Returns the summary, or `None` when skipped or failed (both logged).
pub async fn run_scheduled_sync(state: &AppState) -> Option<ReconcileSummary> {
    info!(url = state.feed.url(), "Starting scheduled player sync");

    let result = sync_from_feed(
        &state.db,
        &state.feed,
        &state.lease,
        ReconcileMode::Replace,
        state.batch_size,
    )
    .await;

    match result {
        Ok(summary) => {
            info!(
                total = summary.total,
                inserted = summary.inserted,
                updated = summary.updated,
                deleted = summary.deleted,
                "Scheduled player sync complete"
            );
            Some(summary)
        }
        Err(PipelineError::Busy) => {
            warn!("Skipping scheduled player sync: another sync is running");
            None
        }
        Err(e) => {
            error!("Scheduled player sync failed: {}", e);
            None
        }
    }
}

/// Spawn the periodic sync task. The first run happens one `period` after
/// startup.
pub fn spawn_sync_schedule(state: AppState, period: Duration) -> JoinHandle<()> {
    info!(
        "Scheduled player sync every {} hour(s)",
        period.as_secs() / 3600
    );

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            run_scheduled_sync(&state).await;
        }
    })
}
