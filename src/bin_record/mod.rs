// Bin records and the fleet store

mod band;
mod history;
mod store;

pub use band::{FillBand, CRITICAL_THRESHOLD, NEEDS_COLLECTION_THRESHOLD, ODOR_ONSET_THRESHOLD};
pub use history::BoundedHistory;
pub use store::BinStore;

use crate::error::WasteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// Mass of a completely full bin (kg)
pub const BIN_CAPACITY_KG: f64 = 50.0;

/// Maximum number of collections kept per bin
pub const BIN_HISTORY_CAPACITY: usize = 10;

pub type CollectionHistory = BoundedHistory<CollectionEntry, BIN_HISTORY_CAPACITY>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Plastic,
    Organic,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 2] = [WasteCategory::Plastic, WasteCategory::Organic];

    pub fn as_str(self) -> &'static str {
        match self {
            WasteCategory::Plastic => "plastic",
            WasteCategory::Organic => "organic",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = WasteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plastic" => Ok(WasteCategory::Plastic),
            "organic" => Ok(WasteCategory::Organic),
            _ => Err(WasteError::UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinStatus {
    Normal,
    NeedsCollection,
    Critical,
}

impl FromStr for BinStatus {
    type Err = WasteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(BinStatus::Normal),
            "needs_collection" => Ok(BinStatus::NeedsCollection),
            "critical" => Ok(BinStatus::Critical),
            _ => Err(WasteError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Good,
    NeedsCleaning,
    MaintenanceRequired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrinderStatus {
    Active,
    Inactive,
    Maintenance,
    NotApplicable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OdorLevel {
    Low,
    Moderate,
    High,
    Critical,
}

/// Estimated time until the bin is full at its current fill rate
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum TimeToFill {
    Hours(u32),
    /// Days, one decimal place
    Days(f64),
    /// Fill rate is zero or negative
    Never,
}

impl TimeToFill {
    pub fn estimate(fill_level: f64, average_fill_rate: f64) -> Self {
        if average_fill_rate.is_nan() || average_fill_rate <= 0.0 {
            return TimeToFill::Never;
        }

        let remaining = (100.0 - fill_level).max(0.0);
        let hours_to_fill = remaining / (average_fill_rate / 24.0);

        // Classify after rounding so 23.5h..24h reads as a day, not "24 hours"
        let whole_hours = hours_to_fill.round();
        if whole_hours < 24.0 {
            TimeToFill::Hours(whole_hours as u32)
        } else {
            TimeToFill::Days(round_to(hours_to_fill / 24.0, 1))
        }
    }
}

impl fmt::Display for TimeToFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeToFill::Hours(1) => write!(f, "1 hour"),
            TimeToFill::Hours(h) => write!(f, "{} hours", h),
            TimeToFill::Days(d) => write!(f, "{:.1} days", d),
            TimeToFill::Never => write!(f, "never"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One collection in a bin's own history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub vehicle_id: String,
    pub waste_category: WasteCategory,
}

/// Mutable state of one physical bin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinRecord {
    /// Unique bin identifier (e.g., "PL-GATE-A")
    pub id: String,

    /// Physical location label
    pub location: String,

    pub coordinates: GeoPoint,

    /// Fixed at creation
    pub waste_category: WasteCategory,

    /// Percent of capacity, always within [0, 100]
    pub fill_level: f64,

    /// Current mass (kg), derived from fill level
    pub weight: f64,

    /// Percent per day; models the foot traffic around the bin
    pub average_fill_rate: f64,

    pub status: BinStatus,

    pub health_status: HealthStatus,

    /// Always `NotApplicable` for plastic bins
    pub grinder_status: GrinderStatus,

    /// Present for organic bins only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odor_level: Option<OdorLevel>,

    pub last_collection: DateTime<Utc>,

    pub last_maintenance: DateTime<Utc>,

    pub time_to_fill: TimeToFill,

    pub collection_history: CollectionHistory,
}

impl BinRecord {
    /// Create a bin with derived fields computed from the given fill level.
    ///
    /// Organic bins start with an active grinder and a low odor level; plastic
    /// bins have no grinder and no odor.
    pub fn new(
        id: &str,
        location: &str,
        coordinates: GeoPoint,
        waste_category: WasteCategory,
        fill_level: f64,
        average_fill_rate: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let (grinder_status, odor_level) = match waste_category {
            WasteCategory::Plastic => (GrinderStatus::NotApplicable, None),
            WasteCategory::Organic => (GrinderStatus::Active, Some(OdorLevel::Low)),
        };

        let mut record = Self {
            id: id.to_string(),
            location: location.to_string(),
            coordinates,
            waste_category,
            fill_level: fill_level.clamp(0.0, 100.0),
            weight: 0.0,
            average_fill_rate,
            status: BinStatus::Normal,
            health_status: HealthStatus::Good,
            grinder_status,
            odor_level,
            last_collection: now,
            last_maintenance: now,
            time_to_fill: TimeToFill::Never,
            collection_history: CollectionHistory::new(),
        };
        record.refresh_derived();
        record
    }

    pub fn is_organic(&self) -> bool {
        self.waste_category == WasteCategory::Organic
    }

    pub fn band(&self) -> FillBand {
        FillBand::classify(self.fill_level)
    }

    /// Recompute weight, status and time-to-fill from the current fill level.
    pub fn refresh_derived(&mut self) {
        self.weight = weight_for(self.fill_level);
        self.status = self.band().status();
        self.time_to_fill = TimeToFill::estimate(self.fill_level, self.average_fill_rate);
    }
}

/// Mass (kg, two decimals) held by a bin at the given fill level
pub fn weight_for(fill_level: f64) -> f64 {
    round_to(fill_level * BIN_CAPACITY_KG / 100.0, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
