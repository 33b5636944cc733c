use super::CollectionEvent;
use std::fmt;

/// Validation errors for CollectionEvent
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingBinId,
    MissingVehicleId,
    InvalidVehicleId(String),
    InvalidAmount(f64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingBinId => write!(f, "binId is required"),
            ValidationError::MissingVehicleId => write!(f, "vehicleId is required"),
            ValidationError::InvalidVehicleId(s) => {
                write!(f, "invalid vehicle id '{}': must be uppercase with optional dashes", s)
            }
            ValidationError::InvalidAmount(amount) => {
                write!(f, "collected amount must be positive and finite, got {}", amount)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a CollectionEvent before it reaches the ledger.
///
/// Validation rules:
/// - Required fields: binId, vehicleId
/// - Vehicle id format: uppercase letters, digits, dashes (e.g., "ORG-TRK-01")
/// - Collected amount: finite and strictly positive
pub fn validate(event: &CollectionEvent) -> Result<(), ValidationError> {
    if event.bin_id.is_empty() {
        return Err(ValidationError::MissingBinId);
    }
    if event.vehicle_id.is_empty() {
        return Err(ValidationError::MissingVehicleId);
    }

    if !is_valid_vehicle_id(&event.vehicle_id) {
        return Err(ValidationError::InvalidVehicleId(event.vehicle_id.clone()));
    }

    if !event.collected_amount.is_finite() || event.collected_amount <= 0.0 {
        return Err(ValidationError::InvalidAmount(event.collected_amount));
    }

    Ok(())
}

/// Vehicle ids are uppercase alphanumeric segments separated by single dashes.
fn is_valid_vehicle_id(id: &str) -> bool {
    if id.starts_with('-') || id.ends_with('-') || id.contains("--") {
        return false;
    }

    id.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}
