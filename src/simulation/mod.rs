// Fill simulation and fleet tick orchestration

pub mod fill;
pub mod odor;
pub mod rng;
mod orchestrator;
mod tick_loop;

pub use fill::{FillSimulator, VehiclePools};
pub use orchestrator::{SkippedBin, TickOrchestrator, TickReport, DEFAULT_BIN_BUDGET};
pub use rng::{PinnedRandom, RandomSource, SimRng};
pub use tick_loop::run_tick_loop;
