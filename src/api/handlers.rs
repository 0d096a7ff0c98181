//! Read API endpoint handlers.
//!
//! Repository calls are synchronous SQLite work behind a mutex, so they run
//! on the blocking pool rather than on the async workers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::error::ApiError;
use crate::analyzers::{self, AnalysisError, DEFAULT_TOP_N, StockSummary};
use crate::models::{DailyPoint, NormalizedStock, ScoredStock};
use crate::query::{MAX_LIMIT, StockQuery};
use crate::services::chart_source::ChartSource;
use crate::store::{StockPage, StockRepository, StoreResult};

/// Number of most recent daily points returned by `/chart`.
pub const CHART_POINTS: usize = 10;

/// Shared state for the read API handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn StockRepository>,
    /// `None` when no chart provider is configured.
    pub chart: Option<Arc<dyn ChartSource>>,
}

impl AppState {
    pub fn new(repo: Arc<dyn StockRepository>) -> Self {
        Self { repo, chart: None }
    }

    pub fn with_chart(mut self, chart: Arc<dyn ChartSource>) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Runs a repository call on the blocking pool.
    async fn with_repo<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StockRepository) -> StoreResult<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        let result = tokio::task::spawn_blocking(move || f(repo.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(result?)
    }
}

/// Raw listing parameters; everything arrives as text.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub field: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<StockQuery, ApiError> {
        let page = parse_number("page", self.page.as_deref())?;
        let limit = parse_number("limit", self.limit.as_deref())?;
        Ok(StockQuery::new(
            self.field.as_deref().unwrap_or_default(),
            self.order.as_deref().unwrap_or_default(),
            self.search.as_deref().unwrap_or_default(),
            page,
            limit,
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    pub top: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Recommendations {
    pub stocks: Vec<ScoredStock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub ticker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub time_series: Vec<DailyPoint>,
}

/// Missing or blank values become 0, which pagination maps to the default.
fn parse_number(name: &str, value: Option<&str>) -> Result<i64, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(0),
        Some(v) => v
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid {name} '{v}'"))),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /stocks?page&limit&field&order&search
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<StockPage>, ApiError> {
    let query = params.into_query()?;
    debug!(?query, "Listing stocks");
    let page = state.with_repo(move |repo| repo.query(&query)).await?;
    Ok(Json(page))
}

/// GET /summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<StockSummary>, ApiError> {
    let stocks = persisted(&state).await?;
    Ok(Json(analyzers::summarize(&stocks)))
}

/// GET /recommendations?top=N
///
/// Re-scores the persisted table as one batch and returns the best `top`.
pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<Recommendations>, ApiError> {
    let top = match parse_number("top", params.top.as_deref())? {
        n if n <= 0 => DEFAULT_TOP_N,
        n => n.min(MAX_LIMIT) as usize,
    };

    let stocks = persisted(&state).await?;
    let stocks = match analyzers::analyze(&stocks, top) {
        Ok(ranked) => ranked,
        Err(AnalysisError::EmptyBatch) => Vec::new(),
    };
    Ok(Json(Recommendations { stocks }))
}

/// GET /chart?ticker=T
///
/// The last [`CHART_POINTS`] days of the ticker's history, oldest first.
pub async fn chart(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let ticker = chart_ticker(params.ticker.as_deref())?;
    let source = state
        .chart
        .as_ref()
        .ok_or(ApiError::Unavailable("chart provider is not configured"))?;

    let mut series = source
        .daily_series(&ticker)
        .await
        .map_err(ApiError::Upstream)?;
    let start = series.len().saturating_sub(CHART_POINTS);

    Ok(Json(ChartResponse {
        time_series: series.split_off(start),
    }))
}

/// Uppercased ticker made of letters, digits, `.` or `-`.
fn chart_ticker(value: Option<&str>) -> Result<String, ApiError> {
    let ticker = value.map(str::trim).unwrap_or_default();
    if ticker.is_empty() {
        return Err(ApiError::BadRequest("ticker is required".to_string()));
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ApiError::BadRequest(format!("invalid ticker '{ticker}'")));
    }
    Ok(ticker.to_uppercase())
}

async fn persisted(state: &AppState) -> Result<Vec<NormalizedStock>, ApiError> {
    let stocks = state.with_repo(|repo| repo.stocks()).await?;
    Ok(stocks.into_iter().map(NormalizedStock::from).collect())
}
