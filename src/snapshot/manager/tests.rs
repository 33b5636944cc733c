use super::*;
use crate::bin_record::BinStore;
use crate::ledger::CollectionLedger;
use crate::seed;
use crate::simulation::{FillSimulator, SimRng};
use chrono::Utc;
use tempfile::TempDir;

fn orchestrator() -> Arc<TickOrchestrator> {
    let now = Utc::now();
    Arc::new(TickOrchestrator::new(
        Arc::new(BinStore::from_records(seed::venue_fleet(now))),
        Arc::new(CollectionLedger::new(seed::ledger_entries(now))),
        FillSimulator::new(seed::vehicle_pools().unwrap()),
        Box::new(SimRng::from_seed_u64(3)),
        now,
    ))
}

fn config(dir: &TempDir, keep_count: usize) -> SnapshotConfig {
    SnapshotConfig {
        enabled: true,
        interval_minutes: 1,
        directory: dir.path().to_path_buf(),
        keep_count,
    }
}

#[test]
fn test_snapshot_now_writes_file() {
    let temp_dir = TempDir::new().unwrap();
    let orch = orchestrator();
    orch.run_tick();

    let manager = SnapshotManager::new(orch.clone(), config(&temp_dir, 5));
    let path = manager.snapshot_now().unwrap();

    let filename = path.file_name().unwrap().to_str().unwrap();
    assert!(filename.starts_with("snapshot-"));
    assert!(filename.ends_with("-tick1.json.gz"));

    let snapshot = Snapshot::load_from_file(&path).unwrap();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.bin_count(), orch.bins().len());
}

#[test]
fn test_snapshot_now_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested").join("snapshots");
    let mut cfg = config(&temp_dir, 5);
    cfg.directory = nested.clone();

    let manager = SnapshotManager::new(orchestrator(), cfg);
    manager.snapshot_now().unwrap();

    assert_eq!(list_snapshots(&nested).unwrap().len(), 1);
}

#[test]
fn test_cleanup_keeps_newest() {
    let temp_dir = TempDir::new().unwrap();
    let orch = orchestrator();
    let manager = SnapshotManager::new(orch.clone(), config(&temp_dir, 3));

    for _ in 0..5 {
        orch.run_tick();
        manager.snapshot_now().unwrap();
        // Distinct millisecond timestamps in file names
        std::thread::sleep(Duration::from_millis(5));
    }

    let mut snapshots = list_snapshots(temp_dir.path()).unwrap();
    assert_eq!(snapshots.len(), 3);

    snapshots.sort();
    let ticks: Vec<u64> = snapshots
        .iter()
        .map(|p| Snapshot::load_from_file(p).unwrap().tick)
        .collect();
    assert_eq!(ticks, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_disabled_loop_returns_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let mut cfg = config(&temp_dir, 3);
    cfg.enabled = false;

    let manager = SnapshotManager::new(orchestrator(), cfg);
    manager.run_snapshot_loop().await.unwrap();

    assert!(list_snapshots(temp_dir.path()).unwrap().is_empty());
}
