use anyhow::{Context, Result};
use binflow::api::{create_query_router, QueryAppState};
use binflow::bin_record::BinStore;
use binflow::config::load_config;
use binflow::ledger::CollectionLedger;
use binflow::seed;
use binflow::simulation::{
    run_tick_loop, FillSimulator, RandomSource, SimRng, TickOrchestrator,
};
use binflow::snapshot::{load_latest_snapshot, SnapshotManager};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "binflow=info".into()),
        )
        .init();

    info!("Binflow starting...");

    let config_path = PathBuf::from(
        std::env::var("BINFLOW_CONFIG").unwrap_or_else(|_| "config.toml".to_string()),
    );
    let mut config = load_config(&config_path)?;
    config.apply_env();

    info!(
        config = %config_path.display(),
        tick_interval_seconds = config.simulation.tick_interval_seconds,
        seed = ?config.simulation.seed,
        bind_address = %config.api.bind_address,
        "Configuration loaded"
    );

    let rng: Box<dyn RandomSource> = match config.simulation.seed {
        Some(seed) => Box::new(SimRng::from_seed_u64(seed)),
        None => Box::new(SimRng::from_entropy()),
    };

    let now = Utc::now();
    let orchestrator = Arc::new(
        TickOrchestrator::new(
            Arc::new(BinStore::from_records(seed::venue_fleet(now))),
            Arc::new(CollectionLedger::new(seed::ledger_entries(now))),
            FillSimulator::new(seed::vehicle_pools().context("Invalid vehicle pools")?),
            rng,
            now,
        )
        .with_bin_budget(Duration::from_millis(config.simulation.bin_budget_ms)),
    );

    // Resume from the newest valid snapshot, otherwise keep the seed fleet
    if config.recovery.auto_recover {
        match load_latest_snapshot(&config.snapshot.directory) {
            Ok(Some(snapshot)) => snapshot.restore_into(&orchestrator),
            Ok(None) => info!(bins = orchestrator.bins().len(), "Starting from seed fleet"),
            Err(e) => warn!(error = %e, "Snapshot recovery failed, starting from seed fleet"),
        }
    } else {
        info!(bins = orchestrator.bins().len(), "Auto-recover disabled, starting from seed fleet");
    }

    // Tick loop
    let tick_handle = if config.simulation.enabled {
        let orch = Arc::clone(&orchestrator);
        let interval_seconds = config.simulation.tick_interval_seconds;
        Some(tokio::spawn(async move {
            run_tick_loop(orch, interval_seconds).await;
        }))
    } else {
        info!("Tick loop disabled; ticks only via POST /api/simulation/tick");
        None
    };

    // Snapshot loop
    let snapshot_manager = Arc::new(SnapshotManager::new(
        Arc::clone(&orchestrator),
        config.snapshot.clone(),
    ));
    let snapshot_handle = {
        let manager = Arc::clone(&snapshot_manager);
        tokio::spawn(async move {
            if let Err(e) = manager.run_snapshot_loop().await {
                error!(error = %e, "Snapshot manager stopped");
            }
        })
    };

    // HTTP API
    let router = create_query_router(Arc::new(QueryAppState {
        orchestrator: Arc::clone(&orchestrator),
    }))
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.api.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.api.bind_address))?;
    info!(address = %config.api.bind_address, "Query API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Query API server error");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    snapshot_handle.abort();
    if let Some(handle) = tick_handle {
        handle.abort();
    }

    // Persist the final state
    if config.snapshot.enabled {
        let manager = Arc::clone(&snapshot_manager);
        match tokio::task::spawn_blocking(move || manager.snapshot_now()).await {
            Ok(Ok(path)) => info!(path = %path.display(), "Final snapshot saved"),
            Ok(Err(e)) => error!(error = %e, "Failed to save final snapshot"),
            Err(e) => error!(error = %e, "Final snapshot task aborted"),
        }
    }

    info!(tick = orchestrator.tick_count(), "Binflow stopped");
    Ok(())
}
