use super::entry::{CollectionRecord, LedgerEntry};
use crate::bin_record::{round_to, WasteCategory};
use serde::Serialize;
use std::collections::HashMap;

pub const TOP_BINS: usize = 5;
pub const TOP_VEHICLES: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedAmount {
    pub id: String,
    pub amount: f64,
}

/// Collection figures for one category over a trailing window
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub category: WasteCategory,
    pub window_days: u32,
    pub total: f64,
    pub daily_average: f64,
    pub record_count: usize,
    pub top_bins: Vec<RankedAmount>,
    pub top_vehicles: Vec<RankedAmount>,
}

impl CollectionStats {
    pub(crate) fn from_records(
        category: WasteCategory,
        window_days: u32,
        records: &[&CollectionRecord],
    ) -> Self {
        let total: f64 = records.iter().map(|r| r.amount).sum();

        Self {
            category,
            window_days,
            total: round_to(total, 2),
            daily_average: round_to(total / f64::from(window_days), 2),
            record_count: records.len(),
            top_bins: rank_by_amount(
                records.iter().map(|r| (r.bin_id.as_str(), r.amount)),
                TOP_BINS,
            ),
            top_vehicles: rank_by_amount(
                records.iter().map(|r| (r.vehicle_id.as_str(), r.amount)),
                TOP_VEHICLES,
            ),
        }
    }
}

/// Sum amounts per id and keep the `limit` largest. Ties keep first-seen order.
fn rank_by_amount<'a>(
    amounts: impl Iterator<Item = (&'a str, f64)>,
    limit: usize,
) -> Vec<RankedAmount> {
    let mut ranked: Vec<RankedAmount> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for (id, amount) in amounts {
        match positions.get(id) {
            Some(&i) => ranked[i].amount += amount,
            None => {
                positions.insert(id, ranked.len());
                ranked.push(RankedAmount {
                    id: id.to_string(),
                    amount,
                });
            }
        }
    }

    for entry in &mut ranked {
        entry.amount = round_to(entry.amount, 2);
    }

    // stable: equal amounts stay in first-seen order
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    ranked.truncate(limit);
    ranked
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEfficiency {
    pub category: WasteCategory,
    pub environmental_score: f64,
    /// collection rate + utilization rate - cost per kg
    pub efficiency_index: f64,
    pub recycling_rate: f64,
    pub collection_rate: f64,
    pub utilization_rate: f64,
    pub cost_per_kg: f64,
}

impl CategoryEfficiency {
    pub(crate) fn from_entry(entry: &LedgerEntry) -> Self {
        let m = &entry.efficiency;
        Self {
            category: entry.category,
            environmental_score: round_to(
                m.recycling_rate * 0.4 + m.collection_rate * 0.3 + m.utilization_rate * 0.3,
                1,
            ),
            efficiency_index: round_to(m.collection_rate + m.utilization_rate - m.cost_per_kg, 2),
            recycling_rate: m.recycling_rate,
            collection_rate: m.collection_rate,
            utilization_rate: m.utilization_rate,
            cost_per_kg: m.cost_per_kg,
        }
    }
}

/// Categories ranked by efficiency index, best first
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyComparison {
    pub categories: Vec<CategoryEfficiency>,
    pub most_efficient: Option<WasteCategory>,
    pub least_efficient: Option<WasteCategory>,
}

impl EfficiencyComparison {
    pub(crate) fn rank(mut categories: Vec<CategoryEfficiency>) -> Self {
        categories.sort_by(|a, b| b.efficiency_index.total_cmp(&a.efficiency_index));

        Self {
            most_efficient: categories.first().map(|c| c.category),
            least_efficient: categories.last().map(|c| c.category),
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sums_per_id() {
        let ranked = rank_by_amount(
            vec![("A", 10.0), ("B", 25.0), ("A", 20.0)].into_iter(),
            5,
        );
        assert_eq!(
            ranked,
            vec![
                RankedAmount { id: "A".to_string(), amount: 30.0 },
                RankedAmount { id: "B".to_string(), amount: 25.0 },
            ]
        );
    }

    #[test]
    fn test_rank_ties_keep_first_seen_order() {
        let ranked = rank_by_amount(
            vec![("C", 5.0), ("A", 5.0), ("B", 5.0), ("D", 1.0)].into_iter(),
            3,
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }
}
