use super::odor;
use super::rng::RandomSource;
use crate::bin_record::{
    round_to, BinRecord, CollectionEntry, GrinderStatus, HealthStatus, OdorLevel, WasteCategory,
    BIN_CAPACITY_KG,
};
use crate::error::WasteError;
use crate::event::CollectionEvent;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Simulated hours per tick
pub const TICK_HOURS: f64 = 1.0;

/// Chance that a collection leaves an active grinder needing cleaning
pub const GRINDER_WEAR_PROBABILITY: f64 = 0.3;

/// A freshly emptied organic bin below this fill level does not smell
pub const FRESH_BIN_FILL_CEILING: f64 = 30.0;

/// Servicing vehicles per waste category. Pools are non-empty and disjoint.
#[derive(Clone, Debug)]
pub struct VehiclePools {
    plastic: Vec<String>,
    organic: Vec<String>,
}

impl VehiclePools {
    pub fn new(plastic: Vec<String>, organic: Vec<String>) -> Result<Self, WasteError> {
        if plastic.is_empty() || organic.is_empty() {
            return Err(WasteError::InvalidVehiclePool(
                "every category needs at least one vehicle".to_string(),
            ));
        }

        let plastic_ids: HashSet<&String> = plastic.iter().collect();
        if let Some(shared) = organic.iter().find(|v| plastic_ids.contains(v)) {
            return Err(WasteError::InvalidVehiclePool(format!(
                "vehicle '{}' is assigned to both categories",
                shared
            )));
        }

        Ok(Self { plastic, organic })
    }

    pub fn pool(&self, category: WasteCategory) -> &[String] {
        match category {
            WasteCategory::Plastic => &self.plastic,
            WasteCategory::Organic => &self.organic,
        }
    }
}

/// Advances one bin by one tick and decides whether it gets collected.
pub struct FillSimulator {
    pools: VehiclePools,
}

impl FillSimulator {
    pub fn new(pools: VehiclePools) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &VehiclePools {
        &self.pools
    }

    /// Advance `bin` by one simulated hour.
    ///
    /// Returns the collection event when the bin reached capacity during the
    /// tick. On error the bin is left exactly as it was.
    pub fn tick(
        &self,
        bin: &mut BinRecord,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<CollectionEvent>, WasteError> {
        if bin.average_fill_rate.is_nan() || bin.average_fill_rate <= 0.0 {
            return Err(WasteError::DegenerateConfiguration {
                bin_id: bin.id.clone(),
                rate: bin.average_fill_rate,
            });
        }

        let hourly_increase = bin.average_fill_rate / 24.0 * TICK_HOURS;
        let tentative_fill = bin.fill_level + hourly_increase;

        let event = if tentative_fill >= 100.0 {
            Some(self.collect(bin, tentative_fill, now, rng))
        } else {
            bin.fill_level = tentative_fill.clamp(0.0, 100.0);
            None
        };

        bin.refresh_derived();

        if bin.is_organic() {
            let level = if event.is_some() && bin.fill_level < FRESH_BIN_FILL_CEILING {
                OdorLevel::Low
            } else {
                odor::assess(bin, now, rng.odor_jitter())
            };
            bin.odor_level = Some(level);
        }

        Ok(event)
    }

    /// Empty the bin and record the collection. The collected amount is the
    /// bin's true content, including any overflow past 100%.
    fn collect(
        &self,
        bin: &mut BinRecord,
        tentative_fill: f64,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> CollectionEvent {
        let pool = self.pools.pool(bin.waste_category);
        let vehicle_id = &pool[rng.pick_index(pool.len())];
        let collected_amount = round_to(tentative_fill * BIN_CAPACITY_KG / 100.0, 2);

        bin.collection_history.push(CollectionEntry {
            timestamp: now,
            amount: collected_amount,
            vehicle_id: vehicle_id.clone(),
            waste_category: bin.waste_category,
        });

        bin.fill_level = rng.residual_fill().clamp(0.0, 100.0);
        bin.last_collection = now;

        if bin.is_organic()
            && bin.grinder_status == GrinderStatus::Active
            && rng.chance(GRINDER_WEAR_PROBABILITY)
        {
            bin.health_status = HealthStatus::NeedsCleaning;
        }

        CollectionEvent::new(
            bin.waste_category,
            &bin.id,
            vehicle_id,
            collected_amount,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_record::{BinStatus, GeoPoint, TimeToFill, BIN_HISTORY_CAPACITY};
    use crate::simulation::rng::{PinnedRandom, SimRng, RESIDUAL_FILL_MAX, RESIDUAL_FILL_MIN};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 10, 12, 0, 0).unwrap()
    }

    fn pools() -> VehiclePools {
        VehiclePools::new(
            vec!["PLS-TRK-01".to_string(), "PLS-TRK-02".to_string()],
            vec!["ORG-TRK-01".to_string()],
        )
        .unwrap()
    }

    fn make_bin(category: WasteCategory, fill: f64, rate: f64) -> BinRecord {
        BinRecord::new(
            "BIN-01",
            "Gate B",
            GeoPoint { lat: 0.0, lng: 0.0 },
            category,
            fill,
            rate,
            now() - Duration::days(1),
        )
    }

    #[test]
    fn test_pools_must_be_non_empty_and_disjoint() {
        assert!(VehiclePools::new(vec![], vec!["ORG-TRK-01".to_string()]).is_err());
        assert!(matches!(
            VehiclePools::new(
                vec!["TRK-01".to_string()],
                vec!["TRK-01".to_string()]
            ),
            Err(WasteError::InvalidVehiclePool(_))
        ));
    }

    #[test]
    fn test_fill_advances_by_hourly_rate() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 40.0, 24.0);

        let event = sim.tick(&mut bin, now(), &mut PinnedRandom::default()).unwrap();

        assert!(event.is_none());
        assert!((bin.fill_level - 41.0).abs() < 1e-9);
        assert_eq!(bin.weight, 20.5);
        assert_eq!(bin.status, BinStatus::Normal);
        assert_eq!(bin.time_to_fill, TimeToFill::Days(2.5));
    }

    #[test]
    fn test_status_crosses_threshold() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 74.5, 24.0);

        sim.tick(&mut bin, now(), &mut PinnedRandom::default()).unwrap();

        assert_eq!(bin.status, BinStatus::NeedsCollection);
        // 24.5% remaining at 1%/h
        assert_eq!(bin.time_to_fill, TimeToFill::Days(1.0));
    }

    #[test]
    fn test_full_plastic_bin_is_collected() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 99.5, 20.0);
        let mut rng = SimRng::from_seed_u64(5);

        let event = sim.tick(&mut bin, now(), &mut rng).unwrap().unwrap();

        assert!((RESIDUAL_FILL_MIN..RESIDUAL_FILL_MAX).contains(&bin.fill_level));
        assert_eq!(bin.collection_history.len(), 1);
        assert_eq!(bin.last_collection, now());
        assert_eq!(bin.status, BinStatus::Normal);
        assert_eq!(bin.odor_level, None);

        assert_eq!(event.bin_id, "BIN-01");
        assert_eq!(event.waste_category, WasteCategory::Plastic);
        assert!(pools()
            .pool(WasteCategory::Plastic)
            .contains(&event.vehicle_id));
        // 99.5 + 20/24 = 100.3333.. -> 50.17 kg
        assert_eq!(event.collected_amount, 50.17);

        let entry = bin.collection_history.latest().unwrap();
        assert_eq!(entry.amount, 50.17);
        assert_eq!(entry.vehicle_id, event.vehicle_id);
    }

    #[test]
    fn test_collected_amount_includes_overflow() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 99.0, 48.0);

        let event = sim
            .tick(&mut bin, now(), &mut PinnedRandom::default())
            .unwrap()
            .unwrap();

        // 99 + 2 = 101% of 50 kg
        assert_eq!(event.collected_amount, 50.5);
    }

    #[test]
    fn test_vehicle_drawn_from_category_pool() {
        let sim = FillSimulator::new(pools());
        let mut rng = SimRng::from_seed_u64(99);

        for _ in 0..50 {
            let mut bin = make_bin(WasteCategory::Organic, 99.9, 30.0);
            let event = sim.tick(&mut bin, now(), &mut rng).unwrap().unwrap();
            assert_eq!(event.vehicle_id, "ORG-TRK-01");
        }
    }

    #[test]
    fn test_history_capped_at_ten_oldest_evicted() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 0.0, 24.0);
        let mut rng = PinnedRandom::default();

        for i in 0..12 {
            bin.fill_level = 99.5;
            let at = now() + Duration::hours(i);
            sim.tick(&mut bin, at, &mut rng).unwrap().unwrap();
            assert!(bin.collection_history.len() <= BIN_HISTORY_CAPACITY);
        }

        assert_eq!(bin.collection_history.len(), BIN_HISTORY_CAPACITY);
        let timestamps: Vec<DateTime<Utc>> =
            bin.collection_history.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps[0], now() + Duration::hours(2));
        assert_eq!(timestamps[9], now() + Duration::hours(11));
    }

    #[test]
    fn test_collection_may_wear_active_grinder() {
        let sim = FillSimulator::new(pools());

        let mut worn = make_bin(WasteCategory::Organic, 99.5, 24.0);
        let mut rng = PinnedRandom {
            chance: true,
            ..PinnedRandom::default()
        };
        sim.tick(&mut worn, now(), &mut rng).unwrap();
        assert_eq!(worn.health_status, HealthStatus::NeedsCleaning);

        let mut inactive = make_bin(WasteCategory::Organic, 99.5, 24.0);
        inactive.grinder_status = GrinderStatus::Inactive;
        sim.tick(&mut inactive, now(), &mut rng).unwrap();
        assert_eq!(inactive.health_status, HealthStatus::Good);

        let mut plastic = make_bin(WasteCategory::Plastic, 99.5, 24.0);
        sim.tick(&mut plastic, now(), &mut rng).unwrap();
        assert_eq!(plastic.health_status, HealthStatus::Good);
    }

    #[test]
    fn test_freshly_collected_organic_bin_has_low_odor() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Organic, 99.5, 24.0);
        bin.health_status = HealthStatus::NeedsCleaning;
        bin.grinder_status = GrinderStatus::Maintenance;
        bin.odor_level = Some(OdorLevel::Critical);
        let mut rng = PinnedRandom {
            jitter: 1,
            ..PinnedRandom::default()
        };

        sim.tick(&mut bin, now(), &mut rng).unwrap().unwrap();

        assert_eq!(bin.odor_level, Some(OdorLevel::Low));
    }

    #[test]
    fn test_organic_odor_recomputed_every_tick() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Organic, 92.0, 24.0);
        bin.grinder_status = GrinderStatus::Maintenance;
        bin.health_status = HealthStatus::NeedsCleaning;

        sim.tick(&mut bin, now(), &mut PinnedRandom::default()).unwrap();

        // 3 (fill) + 2 (health) + 1 (grinder)
        assert_eq!(bin.odor_level, Some(OdorLevel::Critical));
    }

    #[test]
    fn test_zero_rate_is_degenerate_and_leaves_bin_untouched() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 60.0, 0.0);
        let before = bin.clone();

        let err = sim
            .tick(&mut bin, now(), &mut PinnedRandom::default())
            .unwrap_err();

        assert_eq!(
            err,
            WasteError::DegenerateConfiguration {
                bin_id: "BIN-01".to_string(),
                rate: 0.0
            }
        );
        assert_eq!(bin, before);
        assert_eq!(bin.time_to_fill, TimeToFill::Never);
    }

    #[test]
    fn test_negative_rate_is_degenerate_and_leaves_bin_untouched() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Organic, 60.0, -5.0);
        let before = bin.clone();

        let err = sim
            .tick(&mut bin, now(), &mut PinnedRandom::default())
            .unwrap_err();

        assert!(err.is_warning());
        assert_eq!(
            err,
            WasteError::DegenerateConfiguration {
                bin_id: "BIN-01".to_string(),
                rate: -5.0
            }
        );
        assert_eq!(bin, before);
        assert_eq!(bin.time_to_fill, TimeToFill::Never);
    }

    #[test]
    fn test_nan_rate_is_degenerate_and_leaves_bin_untouched() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 60.0, f64::NAN);
        let history_len = bin.collection_history.len();

        let err = sim
            .tick(&mut bin, now(), &mut PinnedRandom::default())
            .unwrap_err();

        // NaN never compares equal, so match the variant and check fields
        match err {
            WasteError::DegenerateConfiguration { bin_id, rate } => {
                assert_eq!(bin_id, "BIN-01");
                assert!(rate.is_nan());
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(bin.fill_level, 60.0);
        assert_eq!(bin.weight, 30.0);
        assert_eq!(bin.status, BinStatus::Normal);
        assert_eq!(bin.collection_history.len(), history_len);
        assert_eq!(bin.time_to_fill, TimeToFill::Never);
    }

    #[test]
    fn test_bin_at_96_percent_with_20_per_day_is_not_collected() {
        let sim = FillSimulator::new(pools());
        let mut bin = make_bin(WasteCategory::Plastic, 96.0, 20.0);

        let event = sim
            .tick(&mut bin, now(), &mut PinnedRandom::default())
            .unwrap();

        // 96 + 20/24 stays under capacity
        assert!(event.is_none());
        assert!((bin.fill_level - (96.0 + 20.0 / 24.0)).abs() < 1e-9);
        assert_eq!(bin.status, BinStatus::Critical);
        assert!(bin.collection_history.is_empty());
    }

    #[test]
    fn test_fill_and_status_invariant_over_many_ticks() {
        let sim = FillSimulator::new(pools());
        let mut rng = SimRng::from_seed_u64(2026);
        let mut bin = make_bin(WasteCategory::Organic, 10.0, 55.0);

        for hour in 0..24 * 30 {
            sim.tick(&mut bin, now() + Duration::hours(hour), &mut rng)
                .unwrap();
            assert!((0.0..=100.0).contains(&bin.fill_level));
            assert_eq!(bin.status, bin.band().status());
            assert!(bin.collection_history.len() <= BIN_HISTORY_CAPACITY);
            assert!(bin.odor_level.is_some());
        }
    }
}
