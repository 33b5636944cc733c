use crate::simulation::TickOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, warn};

/// Periodically advance the fleet by one simulated hour.
///
/// Each tick runs on the blocking pool and is awaited before the next one is
/// scheduled, so ticks never overlap. Ticks missed while a sweep runs long are
/// skipped rather than replayed in a burst.
pub async fn run_tick_loop(orchestrator: Arc<TickOrchestrator>, interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(interval_seconds.max(1)));

    // Skip missed ticks to prevent backlog under load
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick completes immediately; the fleet starts from its seeded state
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let orch = Arc::clone(&orchestrator);
        match tokio::task::spawn_blocking(move || orch.run_tick()).await {
            Ok(report) => {
                let failed = report.failed_bin_ids();
                if !failed.is_empty() {
                    warn!(
                        tick = report.tick,
                        failed = ?failed,
                        "Tick completed with failed bins"
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Tick task aborted");
            }
        }
    }
}
