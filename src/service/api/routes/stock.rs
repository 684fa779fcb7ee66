use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{ChartPoint, NewsItem, StockDetails};
use crate::service::api::routes::normalize_ticker;
use crate::service::api::{ApiError, ApiResult, AppState};
use crate::service::view::resolve_chart_range_str;

const DEFAULT_STOCK_NEWS: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockNewsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub chart_data: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
pub struct StockNewsResponse {
    pub news: Vec<NewsItem>,
}

/// `GET /api/stock/{ticker}/details`
pub async fn details(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<StockDetails>> {
    let ticker = normalize_ticker(&ticker)?;
    let details = state
        .finance
        .get_stock_details(&ticker)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch stock details", e))?;
    Ok(Json(details))
}

/// `GET /api/stock/{ticker}/chart?range=`
pub async fn chart(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartResponse>> {
    let ticker = normalize_ticker(&ticker)?;
    let now = Utc::now();
    let window = resolve_chart_range_str(query.range.as_deref().unwrap_or("1D"), now);

    let chart_data = state
        .finance
        .get_chart(&ticker, window, now)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch chart data", e))?;
    Ok(Json(ChartResponse { chart_data }))
}

/// `GET /api/stock/{ticker}/news?limit=`
pub async fn news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<StockNewsQuery>,
) -> ApiResult<Json<StockNewsResponse>> {
    let ticker = normalize_ticker(&ticker)?;
    let news = state
        .finance
        .get_news(&ticker, query.limit.unwrap_or(DEFAULT_STOCK_NEWS))
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch news", e))?;
    Ok(Json(StockNewsResponse { news }))
}
