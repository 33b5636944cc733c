use crate::bin_record::{BinRecord, GrinderStatus, HealthStatus, OdorLevel};
use chrono::{DateTime, Utc};

/// Weighted odor score for an organic bin.
///
/// Adds the fill band's odor points, a health penalty, a staleness penalty for
/// days since the last collection, the grinder's effect and `jitter`.
pub fn score(bin: &BinRecord, now: DateTime<Utc>, jitter: i32) -> i32 {
    let fill = bin.band().odor_points();

    let health = match bin.health_status {
        HealthStatus::NeedsCleaning => 2,
        HealthStatus::MaintenanceRequired => 1,
        HealthStatus::Good => 0,
    };

    let days_since_collection =
        (now - bin.last_collection).num_milliseconds() as f64 / 86_400_000.0;
    let staleness = if days_since_collection > 3.0 {
        2
    } else if days_since_collection > 2.0 {
        1
    } else {
        0
    };

    let grinder = match bin.grinder_status {
        GrinderStatus::Active => -1,
        GrinderStatus::Maintenance => 1,
        GrinderStatus::Inactive | GrinderStatus::NotApplicable => 0,
    };

    fill + health + staleness + grinder + jitter
}

pub fn level_for_score(score: i32) -> OdorLevel {
    match score {
        s if s >= 6 => OdorLevel::Critical,
        s if s >= 4 => OdorLevel::High,
        s if s >= 2 => OdorLevel::Moderate,
        _ => OdorLevel::Low,
    }
}

pub fn assess(bin: &BinRecord, now: DateTime<Utc>, jitter: i32) -> OdorLevel {
    level_for_score(score(bin, now, jitter))
}
