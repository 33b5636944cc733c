use super::*;
use chrono::TimeZone;
use std::sync::Arc;
use std::thread;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()
}

fn make_bin(id: &str, category: WasteCategory, fill: f64) -> BinRecord {
    BinRecord::new(
        id,
        "North Concourse",
        GeoPoint {
            lat: 51.556,
            lng: -0.2796,
        },
        category,
        fill,
        20.0,
        now(),
    )
}

#[test]
fn test_new_plastic_bin_has_no_grinder_or_odor() {
    let bin = make_bin("PL-01", WasteCategory::Plastic, 40.0);

    assert_eq!(bin.grinder_status, GrinderStatus::NotApplicable);
    assert_eq!(bin.odor_level, None);
    assert_eq!(bin.weight, 20.0);
    assert_eq!(bin.status, BinStatus::Normal);
    assert!(bin.collection_history.is_empty());
}

#[test]
fn test_new_organic_bin_has_grinder_and_odor() {
    let bin = make_bin("OR-01", WasteCategory::Organic, 80.0);

    assert_eq!(bin.grinder_status, GrinderStatus::Active);
    assert!(bin.odor_level.is_some());
    assert_eq!(bin.status, BinStatus::NeedsCollection);
}

#[test]
fn test_new_bin_clamps_fill_level() {
    assert_eq!(make_bin("PL-01", WasteCategory::Plastic, 140.0).fill_level, 100.0);
    assert_eq!(make_bin("PL-02", WasteCategory::Plastic, -5.0).fill_level, 0.0);
}

#[test]
fn test_weight_rounds_to_two_decimals() {
    assert_eq!(weight_for(33.333), 16.67);
    assert_eq!(weight_for(100.0), BIN_CAPACITY_KG);
}

#[test]
fn test_time_to_fill_hours_and_days() {
    // 20%/day -> 0.8333%/h; 10% remaining -> 12h
    assert_eq!(TimeToFill::estimate(90.0, 20.0), TimeToFill::Hours(12));
    // 50% remaining at 20%/day -> 2.5 days
    assert_eq!(TimeToFill::estimate(50.0, 20.0), TimeToFill::Days(2.5));
    // 70% remaining at 30%/day -> 2.333.. days
    assert_eq!(TimeToFill::estimate(30.0, 30.0), TimeToFill::Days(2.3));
}

#[test]
fn test_time_to_fill_never_for_degenerate_rate() {
    assert_eq!(TimeToFill::estimate(50.0, 0.0), TimeToFill::Never);
    assert_eq!(TimeToFill::estimate(50.0, -3.0), TimeToFill::Never);
    assert_eq!(TimeToFill::estimate(50.0, f64::NAN), TimeToFill::Never);
}

#[test]
fn test_time_to_fill_just_under_a_day_reads_as_days() {
    // 23.7% remaining at 1%/h -> 23.7h, which rounds to a full day
    assert_eq!(TimeToFill::estimate(76.3, 24.0), TimeToFill::Days(1.0));
    // 23.4h still rounds down to hours
    assert_eq!(TimeToFill::estimate(76.6, 24.0), TimeToFill::Hours(23));
}

#[test]
fn test_time_to_fill_display() {
    assert_eq!(TimeToFill::Hours(1).to_string(), "1 hour");
    assert_eq!(TimeToFill::Hours(5).to_string(), "5 hours");
    assert_eq!(TimeToFill::Days(2.3).to_string(), "2.3 days");
    assert_eq!(TimeToFill::Never.to_string(), "never");
}

#[test]
fn test_category_and_status_parsing() {
    assert_eq!("Plastic".parse::<WasteCategory>().unwrap(), WasteCategory::Plastic);
    assert_eq!("organic".parse::<WasteCategory>().unwrap(), WasteCategory::Organic);
    assert_eq!(
        "glass".parse::<WasteCategory>().unwrap_err(),
        WasteError::UnknownCategory("glass".to_string())
    );

    assert_eq!(
        "needs_collection".parse::<BinStatus>().unwrap(),
        BinStatus::NeedsCollection
    );
    assert!("full".parse::<BinStatus>().is_err());
}

#[test]
fn test_plastic_bin_serializes_without_odor() {
    let bin = make_bin("PL-01", WasteCategory::Plastic, 40.0);
    let json = serde_json::to_value(&bin).unwrap();

    assert!(json.get("odorLevel").is_none());
    assert_eq!(json["wasteCategory"], "plastic");
    assert_eq!(json["grinderStatus"], "not_applicable");
    assert_eq!(json["timeToFill"]["unit"], "days");
}

#[test]
fn test_store_lists_in_creation_order() {
    let store = BinStore::from_records(vec![
        make_bin("PL-02", WasteCategory::Plastic, 10.0),
        make_bin("OR-01", WasteCategory::Organic, 80.0),
        make_bin("PL-01", WasteCategory::Plastic, 95.0),
    ]);

    let ids: Vec<String> = store.list_bins().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec!["PL-02", "OR-01", "PL-01"]);
    assert_eq!(store.ids(), ids);
}

#[test]
fn test_store_filters_by_category_and_status() {
    let store = BinStore::from_records(vec![
        make_bin("PL-01", WasteCategory::Plastic, 10.0),
        make_bin("PL-02", WasteCategory::Plastic, 95.0),
        make_bin("OR-01", WasteCategory::Organic, 92.0),
    ]);

    assert_eq!(store.list_bins_by_category(WasteCategory::Plastic).len(), 2);
    assert_eq!(store.list_bins_by_category(WasteCategory::Organic).len(), 1);

    let critical: Vec<String> = store
        .list_bins_by_status(BinStatus::Critical)
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(critical, vec!["PL-02", "OR-01"]);
}

#[test]
fn test_store_get_unknown_bin_is_not_found() {
    let store = BinStore::new();
    assert_eq!(
        store.get_bin("missing").unwrap_err(),
        WasteError::not_found("bin", "missing")
    );
}

#[test]
fn test_store_reinsert_keeps_position() {
    let store = BinStore::from_records(vec![
        make_bin("PL-01", WasteCategory::Plastic, 10.0),
        make_bin("PL-02", WasteCategory::Plastic, 20.0),
    ]);

    store.insert(make_bin("PL-01", WasteCategory::Plastic, 55.0));

    assert_eq!(store.ids(), vec!["PL-01", "PL-02"]);
    assert_eq!(store.get_bin("PL-01").unwrap().fill_level, 55.0);
}

#[test]
fn test_store_replace_all() {
    let store = BinStore::from_records(vec![make_bin("PL-01", WasteCategory::Plastic, 10.0)]);

    store.replace_all(vec![
        make_bin("OR-09", WasteCategory::Organic, 30.0),
        make_bin("OR-10", WasteCategory::Organic, 40.0),
    ]);

    assert_eq!(store.len(), 2);
    assert!(store.get_bin("PL-01").is_err());
    assert_eq!(store.ids(), vec!["OR-09", "OR-10"]);
}

#[test]
fn test_store_concurrent_write_back() {
    let ids: Vec<String> = (0..10).map(|i| format!("PL-{:02}", i)).collect();
    let store = Arc::new(BinStore::from_records(
        ids.iter()
            .map(|id| make_bin(id, WasteCategory::Plastic, 0.0))
            .collect(),
    ));

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    let mut bin = store.entry_mut(&id).unwrap();
                    bin.fill_level += 1.0;
                    bin.refresh_derived();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for bin in store.list_bins() {
        assert_eq!(bin.fill_level, 50.0);
        assert_eq!(bin.weight, 25.0);
    }
}
