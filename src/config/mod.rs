use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Complete Binflow configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BinflowConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Tick loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Run the background tick loop
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,
    /// Wall-clock seconds between ticks (each tick is one simulated hour)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    /// Fixed RNG seed; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Per-bin work budget within one tick (milliseconds)
    #[serde(default = "default_bin_budget_ms")]
    pub bin_budget_ms: u64,
}

fn default_simulation_enabled() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    5
}

fn default_bin_budget_ms() -> u64 {
    50
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            tick_interval_seconds: default_tick_interval(),
            seed: None,
            bin_budget_ms: default_bin_budget_ms(),
        }
    }
}

/// Periodic snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_enabled")]
    pub enabled: bool,
    #[serde(default = "default_snapshot_interval")]
    pub interval_minutes: u64,
    #[serde(default = "default_snapshot_directory")]
    pub directory: PathBuf,
    /// Newest snapshots retained; older ones are deleted after each save
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,
}

fn default_snapshot_enabled() -> bool {
    true
}

fn default_snapshot_interval() -> u64 {
    5
}

fn default_snapshot_directory() -> PathBuf {
    PathBuf::from("/var/lib/binflow/snapshots")
}

fn default_keep_count() -> usize {
    10
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_snapshot_enabled(),
            interval_minutes: default_snapshot_interval(),
            directory: default_snapshot_directory(),
            keep_count: default_keep_count(),
        }
    }
}

/// Recovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_auto_recover")]
    pub auto_recover: bool,
}

fn default_auto_recover() -> bool {
    true
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            auto_recover: default_auto_recover(),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl BinflowConfig {
    /// Apply `BINFLOW_*` environment overrides on top of the loaded file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BINFLOW_TICK_INTERVAL_SECONDS") {
            if let Ok(n) = v.parse::<u64>() {
                self.simulation.tick_interval_seconds = n;
            }
        }
        if let Some(v) = lookup("BINFLOW_SEED") {
            if let Ok(n) = v.parse::<u64>() {
                self.simulation.seed = Some(n);
            }
        }
        if let Some(v) = lookup("BINFLOW_BIND_ADDRESS") {
            if !v.trim().is_empty() {
                self.api.bind_address = v;
            }
        }
    }
}

/// Load configuration from a TOML file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<BinflowConfig> {
    if !path.exists() {
        return Ok(BinflowConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: BinflowConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
