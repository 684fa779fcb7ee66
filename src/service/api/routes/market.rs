use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{EarningsEvent, EarningsGroup, IndexQuote, NewsItem};
use crate::service::api::routes::market_today;
use crate::service::api::{ApiError, ApiResult, AppState};
use crate::service::view::group_earnings;

const DEFAULT_MARKET_NEWS: usize = 20;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub indices: Vec<IndexQuote>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/market/overview`
pub async fn overview(State(state): State<AppState>) -> ApiResult<Json<OverviewResponse>> {
    let indices = state
        .finance
        .get_index_quotes()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch market overview", e))?;
    Ok(Json(OverviewResponse { indices }))
}

/// `GET /api/market/news`
pub async fn news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> ApiResult<Json<NewsResponse>> {
    let news = state
        .finance
        .get_market_news(query.limit.unwrap_or(DEFAULT_MARKET_NEWS))
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch market news", e))?;
    Ok(Json(NewsResponse { news }))
}

/// `GET /api/market/earnings`
pub async fn earnings(State(state): State<AppState>) -> ApiResult<Json<Vec<EarningsEvent>>> {
    let (from, to) = earnings_window(market_today(), state.settings.earnings_window_days);
    Ok(Json(fetch_earnings(&state, from, to).await?))
}

/// `GET /api/market/earnings/grouped`
pub async fn earnings_grouped(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EarningsGroup>>> {
    let today = market_today();
    let (from, to) = earnings_window(today, state.settings.earnings_window_days);
    let events = fetch_earnings(&state, from, to).await?;

    let groups = group_earnings(&events, today);
    info!("Grouped {} earnings events into {} groups", events.len(), groups.len());
    Ok(Json(groups))
}

async fn fetch_earnings(
    state: &AppState,
    from: NaiveDate,
    to: NaiveDate,
) -> ApiResult<Vec<EarningsEvent>> {
    state
        .finance
        .get_earnings_range(from, to)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch earnings", e))
}

fn earnings_window(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    let to = Duration::try_days(days)
        .and_then(|d| today.checked_add_signed(d))
        .unwrap_or(today);
    (today, to)
}
