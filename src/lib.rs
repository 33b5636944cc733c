// Error types shared across modules
pub mod error;

// Collection events and validation
pub mod event;

// Bin records and the fleet store
pub mod bin_record;

// Per-category collection ledger
pub mod ledger;

// Fill simulation and tick orchestration
pub mod simulation;

// Start-up fleet
pub mod seed;

// Snapshot persistence and recovery
pub mod snapshot;

// Configuration
pub mod config;

// HTTP query API
pub mod api;
