use crate::snapshot::{list_snapshots, Snapshot};
use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

/// Load the most recent valid snapshot from `snapshot_dir`.
///
/// Snapshots are tried newest to oldest; a corrupt one is logged and
/// skipped. Returns `None` when there is nothing usable, so the caller falls
/// back to the seed fleet.
pub fn load_latest_snapshot(snapshot_dir: &Path) -> Result<Option<Snapshot>> {
    if !snapshot_dir.exists() {
        info!(
            directory = %snapshot_dir.display(),
            "Snapshot directory does not exist, starting from seed fleet"
        );
        return Ok(None);
    }

    let mut snapshots = list_snapshots(snapshot_dir)?;
    if snapshots.is_empty() {
        info!("No snapshots found, starting from seed fleet");
        return Ok(None);
    }

    snapshots.sort_by(|a, b| b.cmp(a));

    info!(
        count = snapshots.len(),
        directory = %snapshot_dir.display(),
        "Attempting to load newest snapshot"
    );

    for path in snapshots {
        match Snapshot::load_from_file(&path) {
            Ok(snapshot) => {
                info!(
                    path = %path.display(),
                    tick = snapshot.tick,
                    clock = %snapshot.clock,
                    bins = snapshot.bin_count(),
                    "Loaded snapshot"
                );
                return Ok(Some(snapshot));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Corrupt snapshot, trying next oldest"
                );
            }
        }
    }

    error!("All snapshots are corrupt, starting from seed fleet");
    Ok(None)
}
