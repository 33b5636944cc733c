use crate::bin_record::WasteCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod validation;

pub use validation::{validate, ValidationError};

/// CollectionEvent records a vehicle emptying a bin.
///
/// Emitted by the fill simulator when a bin reaches capacity, applied to the
/// collection ledger and broadcast to subscribers. Event ids are UUIDv7 so
/// events sort by creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    /// UUIDv7 identifier (time-ordered, globally unique)
    pub event_id: String,

    /// Simulated time of the collection
    pub timestamp: DateTime<Utc>,

    pub waste_category: WasteCategory,

    pub bin_id: String,

    /// Servicing vehicle, drawn from the category's pool
    pub vehicle_id: String,

    /// Mass removed from the bin (kg, two decimals)
    pub collected_amount: f64,
}

impl CollectionEvent {
    pub fn new(
        waste_category: WasteCategory,
        bin_id: &str,
        vehicle_id: &str,
        collected_amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            timestamp,
            waste_category,
            bin_id: bin_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            collected_amount,
        }
    }

    /// Validates the event before it is applied to the ledger.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
