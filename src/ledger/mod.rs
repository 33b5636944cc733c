// Per-category collection ledger

mod entry;
mod stats;

pub use entry::{
    CollectionRecord, CollectionRecords, EfficiencyMetrics, EnvironmentalImpact, LedgerEntry,
    MonthlyPoint, DAYS_PER_MONTH, LEDGER_RECORD_CAPACITY, MONTHLY_TREND_CAPACITY,
};
pub use stats::{
    CategoryEfficiency, CollectionStats, EfficiencyComparison, RankedAmount, TOP_BINS,
    TOP_VEHICLES,
};

use crate::bin_record::{round_to, WasteCategory};
use crate::error::WasteError;
use crate::event::CollectionEvent;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};


/// Running per-category aggregate of every collection event.
///
/// Each category's entry is updated under its own DashMap entry lock, so
/// events for the same category serialize while different categories can be
/// applied concurrently. Percentages span all categories and are refreshed
/// under a separate guard after every change.
pub struct CollectionLedger {
    entries: DashMap<WasteCategory, LedgerEntry>,

    percentage_guard: Mutex<()>,
}

impl CollectionLedger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        let ledger = Self {
            entries: DashMap::new(),
            percentage_guard: Mutex::new(()),
        };
        for entry in entries {
            ledger.entries.insert(entry.category, entry);
        }
        ledger.refresh_percentages();
        ledger
    }

    /// Apply one collection event to its category.
    pub fn apply(&self, event: &CollectionEvent) -> Result<(), WasteError> {
        event.validate()?;

        {
            let mut entry = self
                .entries
                .get_mut(&event.waste_category)
                .ok_or_else(|| {
                    WasteError::not_found("ledger category", event.waste_category.as_str())
                })?;
            entry.record(event);

            debug!(
                category = %event.waste_category,
                bin_id = %event.bin_id,
                amount = event.collected_amount,
                running_total = entry.running_total,
                "Collection applied to ledger"
            );
        }

        self.refresh_percentages();
        Ok(())
    }

    /// Recompute every category's share of the overall total.
    fn refresh_percentages(&self) {
        let _guard = self
            .percentage_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let totals: Vec<(WasteCategory, f64)> = self
            .entries
            .iter()
            .map(|e| (*e.key(), e.running_total))
            .collect();
        let sum: f64 = totals.iter().map(|(_, t)| t).sum();

        for (category, total) in totals {
            if let Some(mut entry) = self.entries.get_mut(&category) {
                entry.percentage = if sum > 0.0 {
                    round_to(total / sum * 100.0, 1)
                } else {
                    0.0
                };
            }
        }
    }

    pub fn get_entry(&self, category: WasteCategory) -> Result<LedgerEntry, WasteError> {
        self.entries
            .get(&category)
            .map(|e| e.clone())
            .ok_or_else(|| WasteError::not_found("ledger category", category.as_str()))
    }

    /// Snapshot of every category's aggregate
    pub fn category_totals(&self) -> BTreeMap<WasteCategory, LedgerEntry> {
        self.entries
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    /// Entries in category order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.category_totals().into_values().collect()
    }

    /// Replace all entries (snapshot recovery)
    pub fn replace_all(&self, entries: Vec<LedgerEntry>) {
        self.entries.clear();
        for entry in entries {
            self.entries.insert(entry.category, entry);
        }
        self.refresh_percentages();

        info!(categories = self.entries.len(), "Ledger replaced");
    }

    /// Collection figures over the `window_days` days up to `now`.
    pub fn collection_stats(
        &self,
        category: WasteCategory,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<CollectionStats, WasteError> {
        if window_days == 0 {
            return Err(WasteError::InvalidWindow(window_days));
        }

        let entry = self
            .entries
            .get(&category)
            .ok_or_else(|| WasteError::not_found("ledger category", category.as_str()))?;

        let cutoff = now - Duration::days(i64::from(window_days));
        let in_window: Vec<&CollectionRecord> = entry
            .collection_records
            .iter()
            .filter(|r| r.timestamp >= cutoff && r.timestamp <= now)
            .collect();

        Ok(CollectionStats::from_records(category, window_days, &in_window))
    }

    pub fn efficiency_comparison(&self) -> EfficiencyComparison {
        let categories = self
            .entries()
            .iter()
            .map(CategoryEfficiency::from_entry)
            .collect();
        EfficiencyComparison::rank(categories)
    }
}
