use super::{BinRecord, BinStatus, WasteCategory};
use crate::error::WasteError;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::sync::RwLock;
use tracing::info;

/// Fleet-wide store of bin records.
///
/// Records are created once at start-up (from seed data or a snapshot) and
/// never deleted. Each record sits behind its own DashMap entry lock, so a
/// tick's write-back of one bin never races with another.
pub struct BinStore {
    bins: DashMap<String, BinRecord>,

    /// Bin ids in creation order; listings and tick sweeps follow it
    order: RwLock<Vec<String>>,
}

impl BinStore {
    pub fn new() -> Self {
        Self {
            bins: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    pub fn from_records(records: Vec<BinRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or overwrite a bin, keeping its original position in the order.
    pub fn insert(&self, record: BinRecord) {
        let id = record.id.clone();
        if self.bins.insert(id.clone(), record).is_none() {
            self.order.write().unwrap().push(id);
        }
    }

    /// Replace the whole fleet (snapshot recovery)
    pub fn replace_all(&self, records: Vec<BinRecord>) {
        let mut order = self.order.write().unwrap();
        self.bins.clear();
        order.clear();

        for record in records {
            order.push(record.id.clone());
            self.bins.insert(record.id.clone(), record);
        }

        info!(bins = order.len(), "Bin store replaced");
    }

    pub fn get_bin(&self, bin_id: &str) -> Result<BinRecord, WasteError> {
        self.bins
            .get(bin_id)
            .map(|b| b.clone())
            .ok_or_else(|| WasteError::not_found("bin", bin_id))
    }

    pub fn list_bins(&self) -> Vec<BinRecord> {
        self.collect_where(|_| true)
    }

    pub fn list_bins_by_category(&self, category: WasteCategory) -> Vec<BinRecord> {
        self.collect_where(|b| b.waste_category == category)
    }

    pub fn list_bins_by_status(&self, status: BinStatus) -> Vec<BinRecord> {
        self.collect_where(|b| b.status == status)
    }

    pub fn ids(&self) -> Vec<String> {
        self.order.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Exclusive handle on one bin for the duration of its tick write-back
    pub(crate) fn entry_mut(&self, bin_id: &str) -> Option<RefMut<'_, String, BinRecord>> {
        self.bins.get_mut(bin_id)
    }

    fn collect_where(&self, keep: impl Fn(&BinRecord) -> bool) -> Vec<BinRecord> {
        let order = self.order.read().unwrap();
        order
            .iter()
            .filter_map(|id| self.bins.get(id))
            .filter(|b| keep(b.value()))
            .map(|b| b.value().clone())
            .collect()
    }
}

impl Default for BinStore {
    fn default() -> Self {
        Self::new()
    }
}
