use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::middleware::request_logging;
use crate::models::{MetricsSnapshot, Record, Summary, DEFAULT_HISTORY_LIMIT};
use crate::records::{
    latest_of, recent_of, RecordStore, RecordStoreError, METRICS_LOG, SIGNALS_LOG, TRADES_LOG,
};
use crate::summary::{summarize, SummaryError};

/// Upper bound on `?limit=` for history endpoints.
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub history_limit: usize,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(store),
            history_limit: DEFAULT_HISTORY_LIMIT,
            static_dir: None,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.min(MAX_HISTORY_LIMIT);
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(get_status))
        .route("/api/metrics", get(get_metrics))
        .route("/api/signals", get(get_signals))
        .route("/api/trades", get(get_trades))
        .route("/api/summary", get(get_summary))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Latest metrics snapshot grouped by venue
async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let metrics = load_log(&state, METRICS_LOG).await?;

    let latest = latest_of(&metrics)
        .ok_or_else(|| ApiError::NotFound("No metrics data".to_string()))?;
    let snapshot = MetricsSnapshot::from_record(latest);

    Ok(Json(StatusResponse {
        timestamp: snapshot.timestamp_secs(),
        as_of: snapshot.as_of().map(|t| t.to_rfc3339()),
        connections: snapshot.connections,
        latency: snapshot.latency,
        ev: snapshot.ev,
        updates_per_sec: snapshot.updates_per_sec,
    }))
}

async fn get_metrics(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    history(&state, METRICS_LOG, params).await
}

async fn get_signals(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    history(&state, SIGNALS_LOG, params).await
}

/// Shadow trades from the paper executor
async fn get_trades(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    history(&state, TRADES_LOG, params).await
}

/// Cross-venue win rate and realized PnL
async fn get_summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let (metrics, signals) = tokio::try_join!(
        load_log(&state, METRICS_LOG),
        load_log(&state, SIGNALS_LOG)
    )?;

    let summary = summarize(latest_of(&metrics), metrics.len(), signals.len())?;
    Ok(Json(summary))
}

async fn history(
    state: &AppState,
    log: &'static str,
    params: HistoryQuery,
) -> Result<Json<Vec<Record>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.history_limit)
        .min(MAX_HISTORY_LIMIT);

    let mut records = load_log(state, log).await?;
    let keep_from = records.len() - recent_of(&records, limit).len();
    records.drain(..keep_from);

    Ok(Json(records))
}

/// Read a log on the blocking pool; each call owns its file handle and buffer.
async fn load_log(state: &AppState, log: &'static str) -> Result<Vec<Record>, ApiError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.load(log))
        .await
        .map_err(|e| ApiError::Internal(format!("record load task failed: {}", e)))?
        .map_err(ApiError::from)
}

// ===== Request/Response Types =====

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    /// Number of most recent records to return
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct StatusResponse {
    /// Snapshot time, seconds since epoch
    timestamp: f64,
    as_of: Option<String>,
    connections: BTreeMap<String, Value>,
    latency: BTreeMap<String, Value>,
    ev: BTreeMap<String, Value>,
    updates_per_sec: Vec<Value>,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Storage(RecordStoreError),
    NotFound(String),
    Internal(String),
}

impl From<RecordStoreError> for ApiError {
    fn from(err: RecordStoreError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<SummaryError> for ApiError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::NoData => ApiError::NotFound("No data".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Storage(err) => {
                tracing::error!("Record log error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
