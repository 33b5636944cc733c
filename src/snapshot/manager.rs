use crate::config::SnapshotConfig;
use crate::simulation::TickOrchestrator;
use crate::snapshot::{list_snapshots, Snapshot};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[cfg(test)]
mod tests;

/// Periodically persists the fleet and ledger
pub struct SnapshotManager {
    orchestrator: Arc<TickOrchestrator>,
    config: SnapshotConfig,
}

impl SnapshotManager {
    pub fn new(orchestrator: Arc<TickOrchestrator>, config: SnapshotConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run until the task is cancelled. Returns immediately when disabled.
    pub async fn run_snapshot_loop(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Snapshot manager disabled, exiting loop");
            return Ok(());
        }

        info!(
            interval_minutes = self.config.interval_minutes,
            directory = %self.config.directory.display(),
            keep_count = self.config.keep_count,
            "Starting snapshot manager"
        );

        fs::create_dir_all(&self.config.directory)
            .context("Failed to create snapshot directory")?;

        let mut timer = interval(Duration::from_secs(self.config.interval_minutes.max(1) * 60));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick fires immediately; nothing has changed yet
        timer.tick().await;

        loop {
            timer.tick().await;

            let orch = Arc::clone(&self.orchestrator);
            let directory = self.config.directory.clone();
            let saved = tokio::task::spawn_blocking(move || {
                Snapshot::from_orchestrator(&orch).save_in(&directory)
            })
            .await;

            match saved {
                Ok(Ok(path)) => {
                    info!(path = %path.display(), "Snapshot saved");
                    if let Err(e) = self.cleanup_old_snapshots() {
                        error!(error = %e, "Failed to clean up old snapshots");
                    }
                }
                Ok(Err(e)) => error!(error = %e, "Failed to create snapshot"),
                Err(e) => error!(error = %e, "Snapshot task aborted"),
            }
        }
    }

    /// Take and save one snapshot now, then prune old ones.
    pub fn snapshot_now(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.directory)
            .context("Failed to create snapshot directory")?;

        let snapshot = Snapshot::from_orchestrator(&self.orchestrator);
        let path = snapshot.save_in(&self.config.directory)?;

        info!(
            tick = snapshot.tick,
            bins = snapshot.bin_count(),
            path = %path.display(),
            "Snapshot saved"
        );

        self.cleanup_old_snapshots()?;
        Ok(path)
    }

    /// Delete all but the newest `keep_count` snapshots
    fn cleanup_old_snapshots(&self) -> Result<()> {
        let mut snapshots = list_snapshots(&self.config.directory)?;
        if snapshots.len() <= self.config.keep_count {
            return Ok(());
        }

        // Timestamped names sort chronologically
        snapshots.sort();

        let delete_count = snapshots.len() - self.config.keep_count;
        for path in &snapshots[..delete_count] {
            match fs::remove_file(path) {
                Ok(()) => info!(path = %path.display(), "Deleted old snapshot"),
                Err(e) => {
                    error!(error = %e, path = %path.display(), "Failed to delete old snapshot")
                }
            }
        }

        Ok(())
    }
}
