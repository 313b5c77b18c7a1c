//! Read-only HTTP surface over the persisted Fear & Greed history.
//!
//! The scoring run owns all writes; this service only loads the history
//! document per request and shapes it for dashboards. An empty, missing, or
//! corrupt store is surfaced as 503 "not yet available", never a crash.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use history_store::{HistoryEntry, HistoryStore, ReadView};
use sentiment_core::SentimentLabel;

#[derive(Clone)]
pub struct AppState {
    pub history_path: PathBuf,
}

/// Current score plus the derived reference points.
#[derive(Serialize)]
pub struct FearGreedResponse {
    pub score: u8,
    pub label: String,
    pub color: String,
    pub as_of: chrono::NaiveDate,
    pub previous_close: Option<u8>,
    pub week_ago: Option<u8>,
    pub month_ago: Option<u8>,
    pub year_ago: Option<u8>,
    pub all_time_low: u8,
    pub all_time_high: u8,
    pub indicators_used: usize,
    pub indicators_total: usize,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl FearGreedResponse {
    fn from_view(view: ReadView) -> Self {
        let label = SentimentLabel::from_score(view.current.value);
        Self {
            score: view.current.value,
            label: view.current.label.clone(),
            color: label.color().to_string(),
            as_of: view.current.date,
            previous_close: view.previous_close,
            week_ago: view.week_ago,
            month_ago: view.month_ago,
            year_ago: view.year_ago,
            all_time_low: view.all_time_low,
            all_time_high: view.all_time_high,
            indicators_used: view.current.indicators_used,
            indicators_total: view.current.indicators_total,
            updated_at: view.current.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Number of trailing entries to return (default: 30).
    #[serde(default = "default_history_days")]
    pub days: usize,
}

fn default_history_days() -> usize {
    30
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub total_retained: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fear-greed", get(get_fear_greed))
        .route("/api/fear-greed/history", get(get_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_fear_greed(State(state): State<AppState>) -> Response {
    let store = HistoryStore::load(&state.history_path);
    match ReadView::from_entries(store.entries()) {
        Some(view) => Json(FearGreedResponse::from_view(view)).into_response(),
        None => not_yet_available(),
    }
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let store = HistoryStore::load(&state.history_path);
    let entries = store.entries();
    if entries.is_empty() {
        return not_yet_available();
    }

    let take = query.days.clamp(1, entries.len());
    Json(HistoryResponse {
        entries: entries[entries.len() - take..].to_vec(),
        total_retained: entries.len(),
    })
    .into_response()
}

fn not_yet_available() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "status": "not_yet_available" })),
    )
        .into_response()
}

pub async fn run_server() -> anyhow::Result<()> {
    let history_path: PathBuf = std::env::var("FNG_HISTORY_PATH")
        .unwrap_or_else(|_| "fng-history.json".to_string())
        .into();
    let bind_addr = std::env::var("FNG_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = router(AppState { history_path });
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("api-server listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
