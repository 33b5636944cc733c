//! Start-up fleet for the stadium deployment.
//!
//! Bins, vehicle pools and the ledger's opening figures. Used when no
//! snapshot is recovered.

use crate::bin_record::{BinRecord, GeoPoint, GrinderStatus, HealthStatus, WasteCategory};
use crate::error::WasteError;
use crate::ledger::{EfficiencyMetrics, EnvironmentalImpact, LedgerEntry};
use crate::simulation::{odor, VehiclePools};
use chrono::{DateTime, Duration, Utc};

struct BinSeed {
    id: &'static str,
    location: &'static str,
    lat: f64,
    lng: f64,
    category: WasteCategory,
    fill_level: f64,
    fill_rate: f64,
    grinder: GrinderStatus,
    health: HealthStatus,
    hours_since_collection: i64,
}

#[rustfmt::skip]
const BINS: [BinSeed; 11] = [
    BinSeed { id: "PL-GATE-A", location: "Gate A Entrance", lat: 51.5560, lng: -0.2795, category: WasteCategory::Plastic, fill_level: 62.0, fill_rate: 28.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::Good, hours_since_collection: 30 },
    BinSeed { id: "PL-GATE-C", location: "Gate C Entrance", lat: 51.5549, lng: -0.2781, category: WasteCategory::Plastic, fill_level: 81.5, fill_rate: 32.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::Good, hours_since_collection: 52 },
    BinSeed { id: "PL-CONC-N", location: "North Concourse", lat: 51.5571, lng: -0.2790, category: WasteCategory::Plastic, fill_level: 44.0, fill_rate: 22.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::Good, hours_since_collection: 20 },
    BinSeed { id: "PL-CONC-S", location: "South Concourse", lat: 51.5546, lng: -0.2799, category: WasteCategory::Plastic, fill_level: 91.0, fill_rate: 35.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::NeedsCleaning, hours_since_collection: 60 },
    BinSeed { id: "PL-FANZONE", location: "Fan Zone", lat: 51.5565, lng: -0.2770, category: WasteCategory::Plastic, fill_level: 27.5, fill_rate: 40.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::Good, hours_since_collection: 8 },
    BinSeed { id: "PL-VIP", location: "VIP Lounge", lat: 51.5558, lng: -0.2806, category: WasteCategory::Plastic, fill_level: 15.0, fill_rate: 12.0, grinder: GrinderStatus::NotApplicable, health: HealthStatus::Good, hours_since_collection: 26 },
    BinSeed { id: "OR-FOOD-E", location: "Food Court East", lat: 51.5563, lng: -0.2775, category: WasteCategory::Organic, fill_level: 73.0, fill_rate: 45.0, grinder: GrinderStatus::Active, health: HealthStatus::Good, hours_since_collection: 36 },
    BinSeed { id: "OR-FOOD-W", location: "Food Court West", lat: 51.5553, lng: -0.2812, category: WasteCategory::Organic, fill_level: 88.0, fill_rate: 42.0, grinder: GrinderStatus::Active, health: HealthStatus::Good, hours_since_collection: 50 },
    BinSeed { id: "OR-KITCHEN", location: "Central Kitchen", lat: 51.5568, lng: -0.2801, category: WasteCategory::Organic, fill_level: 55.0, fill_rate: 30.0, grinder: GrinderStatus::Maintenance, health: HealthStatus::MaintenanceRequired, hours_since_collection: 40 },
    BinSeed { id: "OR-HOSPITALITY", location: "Hospitality Suites", lat: 51.5575, lng: -0.2785, category: WasteCategory::Organic, fill_level: 33.0, fill_rate: 18.0, grinder: GrinderStatus::Inactive, health: HealthStatus::Good, hours_since_collection: 44 },
    BinSeed { id: "OR-CANTEEN", location: "Staff Canteen", lat: 51.5542, lng: -0.2790, category: WasteCategory::Organic, fill_level: 96.0, fill_rate: 26.0, grinder: GrinderStatus::Active, health: HealthStatus::NeedsCleaning, hours_since_collection: 80 },
];

const PLASTIC_VEHICLES: [&str; 3] = ["PLS-TRK-01", "PLS-TRK-02", "PLS-TRK-03"];
const ORGANIC_VEHICLES: [&str; 2] = ["ORG-TRK-01", "ORG-TRK-02"];

/// The stadium's bins as of `now`
pub fn venue_fleet(now: DateTime<Utc>) -> Vec<BinRecord> {
    BINS.iter()
        .map(|seed| {
            let mut bin = BinRecord::new(
                seed.id,
                seed.location,
                GeoPoint {
                    lat: seed.lat,
                    lng: seed.lng,
                },
                seed.category,
                seed.fill_level,
                seed.fill_rate,
                now,
            );
            bin.last_collection = now - Duration::hours(seed.hours_since_collection);
            bin.last_maintenance = now - Duration::days(14);
            bin.health_status = seed.health;

            if bin.is_organic() {
                bin.grinder_status = seed.grinder;
                bin.odor_level = Some(odor::assess(&bin, now, 0));
            }
            bin
        })
        .collect()
}

pub fn vehicle_pools() -> Result<VehiclePools, WasteError> {
    VehiclePools::new(
        PLASTIC_VEHICLES.iter().map(|v| v.to_string()).collect(),
        ORGANIC_VEHICLES.iter().map(|v| v.to_string()).collect(),
    )
}

/// Opening ledger figures for each category
pub fn ledger_entries(now: DateTime<Utc>) -> Vec<LedgerEntry> {
    vec![
        LedgerEntry::new(
            WasteCategory::Plastic,
            1250.0,
            EnvironmentalImpact {
                carbon_saved_kg: 1875.0,
                energy_recovered_kwh: 312.5,
            },
            EfficiencyMetrics {
                recycling_rate: 85.0,
                collection_rate: 92.0,
                utilization_rate: 78.0,
                cost_per_kg: 0.45,
            },
            now,
        ),
        LedgerEntry::new(
            WasteCategory::Organic,
            1850.0,
            EnvironmentalImpact {
                carbon_saved_kg: 925.0,
                energy_recovered_kwh: 2775.0,
            },
            EfficiencyMetrics {
                recycling_rate: 90.0,
                collection_rate: 88.0,
                utilization_rate: 85.0,
                cost_per_kg: 0.38,
            },
            now,
        ),
    ]
}
