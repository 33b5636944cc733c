use crate::event::ValidationError;
use std::fmt;

/// Errors raised by the bin simulation and collection ledger
#[derive(Debug, Clone, PartialEq)]
pub enum WasteError {
    /// Lookup of an unknown bin or ledger category
    NotFound { kind: &'static str, key: String },

    /// Fill rate is zero or negative; the bin cannot advance
    DegenerateConfiguration { bin_id: String, rate: f64 },

    /// The per-bin simulation step panicked
    BinPanicked { bin_id: String },

    /// The per-bin simulation step ran past its work budget
    WatchdogExceeded { bin_id: String, elapsed_ms: u128 },

    UnknownCategory(String),
    UnknownStatus(String),

    /// Statistics window must cover at least one day
    InvalidWindow(u32),

    /// Vehicle pools must be non-empty and disjoint
    InvalidVehiclePool(String),

    InvalidEvent(ValidationError),
}

impl WasteError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        WasteError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Warnings leave the bin untouched for the tick but are not failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, WasteError::DegenerateConfiguration { .. })
    }
}

impl fmt::Display for WasteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasteError::NotFound { kind, key } => write!(f, "{} '{}' not found", kind, key),
            WasteError::DegenerateConfiguration { bin_id, rate } => write!(
                f,
                "bin '{}' has degenerate fill rate {} (must be positive)",
                bin_id, rate
            ),
            WasteError::BinPanicked { bin_id } => {
                write!(f, "simulation step for bin '{}' panicked", bin_id)
            }
            WasteError::WatchdogExceeded { bin_id, elapsed_ms } => write!(
                f,
                "simulation step for bin '{}' exceeded its budget ({} ms)",
                bin_id, elapsed_ms
            ),
            WasteError::UnknownCategory(s) => write!(f, "unknown waste category '{}'", s),
            WasteError::UnknownStatus(s) => write!(f, "unknown bin status '{}'", s),
            WasteError::InvalidWindow(days) => {
                write!(f, "window must be at least 1 day, got {}", days)
            }
            WasteError::InvalidVehiclePool(reason) => write!(f, "invalid vehicle pool: {}", reason),
            WasteError::InvalidEvent(e) => write!(f, "invalid collection event: {}", e),
        }
    }
}

impl std::error::Error for WasteError {}

impl From<ValidationError> for WasteError {
    fn from(e: ValidationError) -> Self {
        WasteError::InvalidEvent(e)
    }
}
