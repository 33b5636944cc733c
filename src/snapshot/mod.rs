use crate::bin_record::{BinRecord, GrinderStatus, WasteCategory};
use crate::ledger::LedgerEntry;
use crate::simulation::TickOrchestrator;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub mod manager;
pub mod recovery;

pub use manager::SnapshotManager;
pub use recovery::load_latest_snapshot;


pub const SNAPSHOT_VERSION: &str = "1";

/// Fleet and ledger state at one tick boundary
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Snapshot format version
    pub snapshot_version: String,

    /// Wall-clock time the snapshot was taken
    pub created_at: DateTime<Utc>,

    /// Ticks completed at snapshot time
    pub tick: u64,

    /// Simulated clock at snapshot time
    pub clock: DateTime<Utc>,

    /// Every bin, in sweep order
    pub bins: Vec<BinRecord>,

    /// Every ledger entry, in category order
    pub ledger: Vec<LedgerEntry>,
}

impl Snapshot {
    /// Capture the orchestrator's state between ticks.
    pub fn from_orchestrator(orchestrator: &TickOrchestrator) -> Self {
        orchestrator.quiesced(|tick, clock| Self {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            created_at: Utc::now(),
            tick,
            clock,
            bins: orchestrator.bins().list_bins(),
            ledger: orchestrator.ledger().entries(),
        })
    }

    /// Load this snapshot into the orchestrator, replacing its state.
    pub fn restore_into(self, orchestrator: &TickOrchestrator) {
        orchestrator.restore(self.bins, self.ledger, self.tick, self.clock);
    }

    /// File name for this snapshot: `snapshot-{timestamp}-tick{n}.json.gz`
    pub fn file_name(&self) -> String {
        format!(
            "snapshot-{}-tick{}.json.gz",
            self.created_at.format("%Y%m%dT%H%M%S%.3fZ"),
            self.tick
        )
    }

    /// Save as gzip-compressed JSON.
    ///
    /// Writes to a `.tmp` sibling, fsyncs, then renames, so a reader never
    /// sees a partial file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_vec(self).context("Failed to serialize snapshot to JSON")?;

        let tmp_path = path.with_extension("tmp");
        {
            let tmp_file =
                File::create(&tmp_path).context("Failed to create temporary snapshot file")?;

            let mut encoder = GzEncoder::new(tmp_file, Compression::default());
            encoder
                .write_all(&json)
                .context("Failed to write compressed snapshot data")?;

            let file = encoder.finish().context("Failed to finish compression")?;
            file.sync_all()
                .context("Failed to sync snapshot file to disk")?;
        }

        fs::rename(&tmp_path, path).context("Failed to rename temporary snapshot file")?;

        Ok(())
    }

    /// Save into `directory` under [`Snapshot::file_name`].
    pub fn save_in(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join(self.file_name());
        self.save_to_file(&path)?;
        Ok(path)
    }

    /// Load a `.json.gz` snapshot (plain `.json` is also accepted).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).context("Failed to open snapshot file")?;

        let is_compressed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "gz")
            .unwrap_or(false);

        let mut json = String::new();
        if is_compressed {
            GzDecoder::new(file)
                .read_to_string(&mut json)
                .context("Failed to decompress snapshot file")?;
        } else {
            let mut file = file;
            file.read_to_string(&mut json)
                .context("Failed to read snapshot file")?;
        }

        let snapshot: Snapshot =
            serde_json::from_str(&json).context("Failed to deserialize snapshot JSON")?;

        if snapshot.snapshot_version != SNAPSHOT_VERSION {
            bail!(
                "Unsupported snapshot version '{}'",
                snapshot.snapshot_version
            );
        }
        snapshot.validate()?;

        Ok(snapshot)
    }

    /// Reject state a live fleet can never reach: fill outside 0..=100,
    /// odor on a plastic bin (or none on an organic one), a grinder on a
    /// plastic bin, duplicate bin ids, or a ledger missing a category.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for bin in &self.bins {
            if !seen.insert(bin.id.as_str()) {
                bail!("Duplicate bin '{}' in snapshot", bin.id);
            }
            if !(0.0..=100.0).contains(&bin.fill_level) {
                bail!("Bin '{}' has fill level {} outside 0..=100", bin.id, bin.fill_level);
            }
            if bin.odor_level.is_some() != bin.is_organic() {
                bail!(
                    "Bin '{}' ({}) has inconsistent odor level {:?}",
                    bin.id,
                    bin.waste_category,
                    bin.odor_level
                );
            }
            if !bin.is_organic() && bin.grinder_status != GrinderStatus::NotApplicable {
                bail!("Plastic bin '{}' has grinder status {:?}", bin.id, bin.grinder_status);
            }
        }

        for category in WasteCategory::ALL {
            if !self.ledger.iter().any(|entry| entry.category == category) {
                bail!("Snapshot ledger has no '{}' entry", category);
            }
        }

        Ok(())
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

/// `snapshot-*.json.gz` (and legacy `.json`) files in `directory`
pub(crate) fn list_snapshots(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory).context("Failed to read snapshot directory")?;

    let mut snapshots = Vec::new();
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            let is_snapshot = name.ends_with(".json.gz") || name.ends_with(".json");
            if name.starts_with("snapshot-") && is_snapshot {
                snapshots.push(path);
            }
        }
    }

    Ok(snapshots)
}
