use super::fill::{FillSimulator, TICK_HOURS};
use super::rng::RandomSource;
use crate::bin_record::{BinRecord, BinStore, WasteCategory};
use crate::error::WasteError;
use crate::event::CollectionEvent;
use crate::ledger::{CollectionLedger, CollectionStats};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Default per-bin work budget for one tick
pub const DEFAULT_BIN_BUDGET: Duration = Duration::from_millis(50);

/// State owned by whoever holds the tick lock
struct TickState {
    rng: Box<dyn RandomSource>,
    clock: DateTime<Utc>,
    tick: u64,
}

/// A bin that did not advance during a tick
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedBin {
    pub bin_id: String,
    pub reason: WasteError,
}

/// Outcome of one fleet sweep
#[derive(Clone, Debug)]
pub struct TickReport {
    pub tick: u64,
    pub simulated_at: DateTime<Utc>,
    pub bins_advanced: usize,
    /// Collection events in the order they were produced
    pub events: Vec<CollectionEvent>,
    pub skipped: Vec<SkippedBin>,
}

impl TickReport {
    /// Bins skipped because of a failure (warnings excluded)
    pub fn failed_bin_ids(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|s| !s.reason.is_warning())
            .map(|s| s.bin_id.as_str())
            .collect()
    }

    /// Bins skipped with a warning (degenerate configuration)
    pub fn warned_bin_ids(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|s| s.reason.is_warning())
            .map(|s| s.bin_id.as_str())
            .collect()
    }
}

/// Drives the fill simulation across the whole fleet, one simulated hour per
/// tick, and feeds collection events into the ledger.
pub struct TickOrchestrator {
    bins: Arc<BinStore>,
    ledger: Arc<CollectionLedger>,
    simulator: FillSimulator,

    /// Held for the whole sweep; ticks never overlap
    state: Mutex<TickState>,

    bin_budget: Duration,

    /// Broadcast channel for collection events
    collection_tx: broadcast::Sender<CollectionEvent>,
}

impl TickOrchestrator {
    pub fn new(
        bins: Arc<BinStore>,
        ledger: Arc<CollectionLedger>,
        simulator: FillSimulator,
        rng: Box<dyn RandomSource>,
        start: DateTime<Utc>,
    ) -> Self {
        let (collection_tx, _) = broadcast::channel(1000);

        Self {
            bins,
            ledger,
            simulator,
            state: Mutex::new(TickState {
                rng,
                clock: start,
                tick: 0,
            }),
            bin_budget: DEFAULT_BIN_BUDGET,
            collection_tx,
        }
    }

    pub fn with_bin_budget(mut self, budget: Duration) -> Self {
        self.bin_budget = budget;
        self
    }

    pub fn bins(&self) -> &Arc<BinStore> {
        &self.bins
    }

    pub fn ledger(&self) -> &Arc<CollectionLedger> {
        &self.ledger
    }

    /// Current simulated time
    pub fn now(&self) -> DateTime<Utc> {
        self.lock_state().clock
    }

    pub fn tick_count(&self) -> u64 {
        self.lock_state().tick
    }

    /// Subscribe to collection events
    pub fn subscribe_collections(&self) -> broadcast::Receiver<CollectionEvent> {
        self.collection_tx.subscribe()
    }

    /// Collection stats over the trailing window, ending at the simulated now.
    /// Waits for an in-flight tick so the window and the records agree.
    pub fn collection_stats(
        &self,
        category: WasteCategory,
        window_days: u32,
    ) -> Result<CollectionStats, WasteError> {
        self.quiesced(|_, now| self.ledger.collection_stats(category, window_days, now))
    }

    /// Run `f` while no tick is in flight, so it never observes a bin that is
    /// half-way through its update.
    pub fn quiesced<R>(&self, f: impl FnOnce(u64, DateTime<Utc>) -> R) -> R {
        let state = self.lock_state();
        f(state.tick, state.clock)
    }

    /// Replace fleet, ledger, clock and tick counter (snapshot recovery).
    /// Weight, status and time-to-fill are recomputed for every bin.
    pub fn restore(
        &self,
        mut bins: Vec<BinRecord>,
        ledger: Vec<crate::ledger::LedgerEntry>,
        tick: u64,
        clock: DateTime<Utc>,
    ) {
        for bin in &mut bins {
            bin.refresh_derived();
        }

        let mut state = self.lock_state();
        self.bins.replace_all(bins);
        self.ledger.replace_all(ledger);
        state.tick = tick;
        state.clock = clock;

        info!(tick = tick, clock = %clock, "Simulation state restored");
    }

    /// Advance every bin by one simulated hour.
    ///
    /// Bins are swept in creation order. A bin whose step fails, panics or
    /// overruns its budget keeps its previous state and is listed in the
    /// report; the rest of the fleet still advances. Running this twice
    /// advances the fleet twice.
    pub fn run_tick(&self) -> TickReport {
        let mut state = self.lock_state();
        state.tick += 1;
        state.clock += ChronoDuration::hours(TICK_HOURS as i64);

        let now = state.clock;
        let mut report = TickReport {
            tick: state.tick,
            simulated_at: now,
            bins_advanced: 0,
            events: Vec::new(),
            skipped: Vec::new(),
        };

        for bin_id in self.bins.ids() {
            match self.advance_bin(&bin_id, now, state.rng.as_mut()) {
                Ok(event) => {
                    report.bins_advanced += 1;
                    if let Some(event) = event {
                        self.publish(&event);
                        report.events.push(event);
                    }
                }
                Err(reason) => {
                    if reason.is_warning() {
                        warn!(bin_id = %bin_id, error = %reason, "Bin skipped for tick");
                    } else {
                        error!(bin_id = %bin_id, error = %reason, "Bin failed during tick");
                    }
                    report.skipped.push(SkippedBin { bin_id, reason });
                }
            }
        }

        info!(
            tick = report.tick,
            simulated_at = %report.simulated_at,
            advanced = report.bins_advanced,
            collections = report.events.len(),
            skipped = report.skipped.len(),
            "Tick complete"
        );

        report
    }

    /// Simulate one bin on a copy and write it back only on success.
    fn advance_bin(
        &self,
        bin_id: &str,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<CollectionEvent>, WasteError> {
        let mut entry = self
            .bins
            .entry_mut(bin_id)
            .ok_or_else(|| WasteError::not_found("bin", bin_id))?;

        let mut next = entry.clone();
        let started = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.simulator.tick(&mut next, now, rng)
        }))
        .map_err(|_| WasteError::BinPanicked {
            bin_id: bin_id.to_string(),
        })?;
        let event = outcome?;

        let elapsed = started.elapsed();
        if elapsed > self.bin_budget {
            return Err(WasteError::WatchdogExceeded {
                bin_id: bin_id.to_string(),
                elapsed_ms: elapsed.as_millis(),
            });
        }

        *entry = next;
        Ok(event)
    }

    /// Fold an event into the ledger and broadcast it.
    fn publish(&self, event: &CollectionEvent) {
        if let Err(e) = self.ledger.apply(event) {
            error!(
                event_id = %event.event_id,
                bin_id = %event.bin_id,
                error = %e,
                "Failed to apply collection to ledger"
            );
        }

        // No subscribers is fine
        let _ = self.collection_tx.send(event.clone());
    }

    fn lock_state(&self) -> MutexGuard<'_, TickState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
