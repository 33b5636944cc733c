use super::BinStatus;
use serde::Serialize;

/// Fill level at which a bin needs to be scheduled for collection
pub const NEEDS_COLLECTION_THRESHOLD: f64 = 75.0;

/// Fill level at which a bin is critical
pub const CRITICAL_THRESHOLD: f64 = 90.0;

/// Fill level at which an organic bin starts to contribute odor
pub const ODOR_ONSET_THRESHOLD: f64 = 50.0;

/// Fill bands, highest lower bound first.
///
/// Status, odor contribution and dashboard color all read this table.
const BANDS: [(f64, FillBand); 4] = [
    (CRITICAL_THRESHOLD, FillBand::Full),
    (NEEDS_COLLECTION_THRESHOLD, FillBand::High),
    (ODOR_ONSET_THRESHOLD, FillBand::Moderate),
    (f64::NEG_INFINITY, FillBand::Low),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBand {
    Low,
    Moderate,
    High,
    Full,
}

impl FillBand {
    pub fn classify(fill_level: f64) -> Self {
        BANDS
            .iter()
            .find(|(lower, _)| fill_level >= *lower)
            .map(|(_, band)| *band)
            .unwrap_or(FillBand::Low)
    }

    pub fn status(self) -> BinStatus {
        match self {
            FillBand::Low | FillBand::Moderate => BinStatus::Normal,
            FillBand::High => BinStatus::NeedsCollection,
            FillBand::Full => BinStatus::Critical,
        }
    }

    /// Contribution of this band to the organic odor score
    pub fn odor_points(self) -> i32 {
        match self {
            FillBand::Low => 0,
            FillBand::Moderate => 1,
            FillBand::High => 2,
            FillBand::Full => 3,
        }
    }

    /// Map/table color used by the dashboard
    pub fn color(self) -> &'static str {
        match self {
            FillBand::Low => "#22c55e",
            FillBand::Moderate => "#eab308",
            FillBand::High => "#f97316",
            FillBand::Full => "#ef4444",
        }
    }
}
