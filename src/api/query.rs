use crate::bin_record::{BinRecord, BinStatus, WasteCategory};
use crate::error::WasteError;
use crate::event::CollectionEvent;
use crate::ledger::{CollectionStats, EfficiencyComparison, LedgerEntry};
use crate::simulation::{TickOrchestrator, TickReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

/// Default trailing window for collection stats (days)
const DEFAULT_STATS_WINDOW_DAYS: u32 = 7;

/// Shared state for the query API
pub struct QueryAppState {
    pub orchestrator: Arc<TickOrchestrator>,
}

/// Query parameters for bin listing
#[derive(Deserialize)]
pub struct BinQueryParams {
    /// Filter by waste category (`plastic`, `organic`)
    pub category: Option<String>,
    /// Filter by status (`normal`, `needs_collection`, `critical`)
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub window_days: Option<u32>,
}

/// Bin with the dashboard's display fields
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinResponse {
    #[serde(flatten)]
    pub bin: BinRecord,
    pub fill_color: &'static str,
    pub time_to_fill_label: String,
}

impl From<BinRecord> for BinResponse {
    fn from(bin: BinRecord) -> Self {
        Self {
            fill_color: bin.band().color(),
            time_to_fill_label: bin.time_to_fill.to_string(),
            bin,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickResponse {
    pub tick: u64,
    pub simulated_at: DateTime<Utc>,
    pub bins_advanced: usize,
    pub collections: Vec<CollectionEvent>,
    pub failed_bins: Vec<String>,
    pub warned_bins: Vec<String>,
}

impl From<TickReport> for TickResponse {
    fn from(report: TickReport) -> Self {
        let failed_bins = report.failed_bin_ids().into_iter().map(String::from).collect();
        let warned_bins = report.warned_bin_ids().into_iter().map(String::from).collect();
        Self {
            tick: report.tick,
            simulated_at: report.simulated_at,
            bins_advanced: report.bins_advanced,
            collections: report.events,
            failed_bins,
            warned_bins,
        }
    }
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/bins", get(list_bins))
        .route("/api/bins/:id", get(get_bin))
        .route("/api/ledger/totals", get(ledger_totals))
        .route("/api/ledger/efficiency", get(efficiency))
        .route("/api/ledger/:category/stats", get(collection_stats))
        .route("/api/simulation/tick", post(run_tick))
        .with_state(state)
}

/// GET /api/bins - List bins in sweep order
///
/// Reads in this module wait for an in-flight tick, so a response never mixes
/// bins from before and after the same tick.
///
/// Query parameters:
/// - `category`: only bins of this waste category
/// - `status`: only bins in this status
///
/// Both filters can be combined (AND logic).
async fn list_bins(
    State(state): State<Arc<QueryAppState>>,
    Query(params): Query<BinQueryParams>,
) -> Result<Json<Vec<BinResponse>>, QueryError> {
    let category = params
        .category
        .as_deref()
        .map(str::parse::<WasteCategory>)
        .transpose()
        .map_err(QueryError::BadRequest)?;
    let status = params
        .status
        .as_deref()
        .map(str::parse::<BinStatus>)
        .transpose()
        .map_err(QueryError::BadRequest)?;

    let store = state.orchestrator.bins();
    let bins = state.orchestrator.quiesced(|_, _| match category {
        Some(category) => store.list_bins_by_category(category),
        None => store.list_bins(),
    });

    let response = bins
        .into_iter()
        .filter(|bin| status.map_or(true, |s| bin.status == s))
        .map(BinResponse::from)
        .collect();

    Ok(Json(response))
}

/// GET /api/bins/:id
async fn get_bin(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<String>,
) -> Result<Json<BinResponse>, QueryError> {
    let bin = state
        .orchestrator
        .quiesced(|_, _| state.orchestrator.bins().get_bin(&id))?;
    Ok(Json(BinResponse::from(bin)))
}

/// GET /api/ledger/totals - Every category's aggregate, keyed by category
async fn ledger_totals(
    State(state): State<Arc<QueryAppState>>,
) -> Json<BTreeMap<WasteCategory, LedgerEntry>> {
    let ledger = state.orchestrator.ledger();
    Json(state.orchestrator.quiesced(|_, _| ledger.category_totals()))
}

/// GET /api/ledger/:category/stats?windowDays=N
async fn collection_stats(
    State(state): State<Arc<QueryAppState>>,
    Path(category): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<CollectionStats>, QueryError> {
    let category: WasteCategory = category.parse()?;
    let window_days = params.window_days.unwrap_or(DEFAULT_STATS_WINDOW_DAYS);

    let stats = state.orchestrator.collection_stats(category, window_days)?;
    Ok(Json(stats))
}

/// GET /api/ledger/efficiency
async fn efficiency(State(state): State<Arc<QueryAppState>>) -> Json<EfficiencyComparison> {
    let ledger = state.orchestrator.ledger();
    Json(state.orchestrator.quiesced(|_, _| ledger.efficiency_comparison()))
}

/// POST /api/simulation/tick - Advance the fleet one simulated hour now
async fn run_tick(
    State(state): State<Arc<QueryAppState>>,
) -> Result<Json<TickResponse>, QueryError> {
    let orch = Arc::clone(&state.orchestrator);
    let report = tokio::task::spawn_blocking(move || orch.run_tick())
        .await
        .map_err(|e| {
            error!(error = %e, "Manual tick task aborted");
            QueryError::Internal
        })?;

    Ok(Json(TickResponse::from(report)))
}

/// Query error types
#[derive(Debug)]
enum QueryError {
    NotFound(WasteError),
    BadRequest(WasteError),
    Internal,
}

impl From<WasteError> for QueryError {
    fn from(e: WasteError) -> Self {
        match e {
            WasteError::NotFound { .. } | WasteError::UnknownCategory(_) => {
                QueryError::NotFound(e)
            }
            other => QueryError::BadRequest(other),
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            QueryError::NotFound(e) => (StatusCode::NOT_FOUND, e.to_string()),
            QueryError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            QueryError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Tick failed".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
