use crate::bin_record::{round_to, BoundedHistory, WasteCategory};
use crate::event::CollectionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of collection records kept per category
pub const LEDGER_RECORD_CAPACITY: usize = 50;

/// Months of trend data kept per category
pub const MONTHLY_TREND_CAPACITY: usize = 12;

/// Fixed month length used for the daily average
pub const DAYS_PER_MONTH: f64 = 30.0;

pub type CollectionRecords = BoundedHistory<CollectionRecord, LEDGER_RECORD_CAPACITY>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub bin_id: String,
    pub vehicle_id: String,
}

/// Running total for one calendar month ("YYYY-MM")
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalImpact {
    pub carbon_saved_kg: f64,
    pub energy_recovered_kwh: f64,
}

impl EnvironmentalImpact {
    /// Grow the impact figures in proportion to collected volume.
    fn scale(&mut self, growth_factor: f64) {
        self.carbon_saved_kg = round_to(self.carbon_saved_kg * growth_factor, 2);
        self.energy_recovered_kwh = round_to(self.energy_recovered_kwh * growth_factor, 2);
    }
}

/// Operational rates for a category (percent, except cost per kg)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    pub recycling_rate: f64,
    pub collection_rate: f64,
    pub utilization_rate: f64,
    pub cost_per_kg: f64,
}

/// Aggregate state of one waste category
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub category: WasteCategory,

    /// Mass collected over the simulation's lifetime (kg)
    pub running_total: f64,

    /// Share of all categories' totals, one decimal
    pub percentage: f64,

    pub daily_average: f64,

    pub collection_records: CollectionRecords,

    pub monthly_trend: Vec<MonthlyPoint>,

    pub environmental: EnvironmentalImpact,

    pub efficiency: EfficiencyMetrics,
}

impl LedgerEntry {
    pub fn new(
        category: WasteCategory,
        running_total: f64,
        environmental: EnvironmentalImpact,
        efficiency: EfficiencyMetrics,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            running_total,
            percentage: 0.0,
            daily_average: round_to(running_total / DAYS_PER_MONTH, 2),
            collection_records: CollectionRecords::new(),
            monthly_trend: vec![MonthlyPoint {
                month: month_label(now),
                amount: running_total,
            }],
            environmental,
            efficiency,
        }
    }

    /// Fold one collection into the aggregate. Percentages are not touched;
    /// they depend on every category and are refreshed by the ledger.
    pub(crate) fn record(&mut self, event: &CollectionEvent) {
        self.collection_records.push(CollectionRecord {
            timestamp: event.timestamp,
            amount: event.collected_amount,
            bin_id: event.bin_id.clone(),
            vehicle_id: event.vehicle_id.clone(),
        });

        let old_total = self.running_total;
        let new_total = round_to(old_total + event.collected_amount, 2);
        let growth_factor = if old_total > 0.0 {
            new_total / old_total
        } else {
            1.0
        };

        self.running_total = new_total;
        self.daily_average = round_to(new_total / DAYS_PER_MONTH, 2);
        self.update_current_month(event.timestamp);
        self.environmental.scale(growth_factor);
    }

    /// The current month's bucket mirrors the running total.
    fn update_current_month(&mut self, at: DateTime<Utc>) {
        let month = month_label(at);

        match self.monthly_trend.last_mut() {
            Some(point) if point.month == month => point.amount = self.running_total,
            _ => {
                self.monthly_trend.push(MonthlyPoint {
                    month,
                    amount: self.running_total,
                });
                if self.monthly_trend.len() > MONTHLY_TREND_CAPACITY {
                    let excess = self.monthly_trend.len() - MONTHLY_TREND_CAPACITY;
                    self.monthly_trend.drain(..excess);
                }
            }
        }
    }
}

fn month_label(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}
