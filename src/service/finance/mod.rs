use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, NaiveDate, Utc};
use finance_query_core::{FetchClient, YahooAuthManager, YahooError, YahooFinanceClient};
use serde_json::Value;
use tracing::info;

use crate::models::{ChartPoint, ChartWindow, EarningsEvent, IndexQuote, NewsItem, OptionsChain, StockDetails};
use crate::service::view::market_overview::{self, QuoteFields, INDEX_TICKERS};

pub mod chart;
pub mod earnings;
pub mod news;
pub mod options;

#[derive(Debug, thiserror::Error)]
pub enum FinanceServiceError {
    #[error(transparent)]
    Yahoo(#[from] YahooError),
    #[error("No data found for {0}")]
    NotFound(String),
    #[error("Upstream API error: {0}")]
    Http(String),
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FinanceServiceError {
    /// Fold the provider's "unknown symbol" answers into `NotFound(what)`.
    ///
    /// Yahoo signals these as HTTP 404 or as a 200 with an empty result list.
    pub(crate) fn from_yahoo(what: impl Into<String>, err: YahooError) -> Self {
        match err {
            YahooError::NotFound(_) => FinanceServiceError::NotFound(what.into()),
            YahooError::ParseError(msg) if msg.starts_with("No option") => {
                FinanceServiceError::NotFound(what.into())
            }
            other => FinanceServiceError::Yahoo(other),
        }
    }
}

/// Everything the dashboard fetches from market-data providers.
pub struct FinanceService {
    /// Authenticated Yahoo client (cookie + crumb) for quotes, options and charts.
    client: Arc<YahooFinanceClient>,
    /// Plain HTTP client for the Finnhub calendar.
    http: reqwest::Client,
    finnhub_api_key: Option<String>,
}

impl FinanceService {
    /// Build a finance service with optional proxy support.
    pub fn new(
        proxy: Option<String>,
        finnhub_api_key: Option<String>,
    ) -> Result<Self, FinanceServiceError> {
        let fetch = Arc::new(FetchClient::new(proxy.clone())?);
        let auth = Arc::new(YahooAuthManager::new(proxy.clone(), fetch.cookie_jar().clone()));
        let client = Arc::new(YahooFinanceClient::new(auth, fetch));

        let mut builder = reqwest::Client::builder().timeout(StdDuration::from_secs(15));
        if let Some(url) = proxy.as_deref() {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| FinanceServiceError::InvalidInput(format!("proxy {url}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| FinanceServiceError::Http(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            http,
            finnhub_api_key: finnhub_api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Quotes for the overview index tiles, in display order.
    pub async fn get_index_quotes(&self) -> Result<Vec<IndexQuote>, FinanceServiceError> {
        let symbols: Vec<&str> = INDEX_TICKERS.iter().map(|(s, _)| *s).collect();
        info!("Fetching overview quotes for {} indices", symbols.len());

        let data = self.client.get_simple_quotes(&symbols).await?;
        let mut quotes = extract_quote_fields(&data);
        quotes.sort_by_key(|q| {
            symbols
                .iter()
                .position(|s| *s == q.symbol)
                .unwrap_or(usize::MAX)
        });

        Ok(quotes.iter().map(market_overview::format_index_quote).collect())
    }

    /// Header data for the single stock view.
    pub async fn get_stock_details(
        &self,
        symbol: &str,
    ) -> Result<StockDetails, FinanceServiceError> {
        let summary = self
            .client
            .get_quote_summary(symbol, &["price", "summaryDetail", "assetProfile"])
            .await?;

        let result = summary
            .get("quoteSummary")
            .and_then(|q| q.get("result"))
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| FinanceServiceError::NotFound(symbol.to_uppercase()))?;

        let details = details_from_summary(symbol, result);
        if details.price.is_none() {
            return Err(FinanceServiceError::NotFound(symbol.to_uppercase()));
        }
        Ok(details)
    }

    /// Fetch news for a symbol (limited number of items). Empty is not an error.
    pub async fn get_news(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>, FinanceServiceError> {
        let limit = limit.clamp(1, 20);
        Ok(news::fetch_news(self.client.as_ref(), symbol, limit).await?)
    }

    /// Headlines across the broad market, newest first.
    pub async fn get_market_news(&self, limit: usize) -> Result<Vec<NewsItem>, FinanceServiceError> {
        let limit = limit.clamp(1, 50);
        Ok(news::fetch_market_news(self.client.as_ref(), limit).await?)
    }

    /// Expiration dates (`YYYY-MM-DD`) listed for a ticker.
    pub async fn get_option_expirations(
        &self,
        symbol: &str,
    ) -> Result<Vec<String>, FinanceServiceError> {
        options::fetch_expirations(self.client.as_ref(), symbol).await
    }

    /// Options chain for one expiration, or the nearest one when `None`.
    pub async fn get_options_chain(
        &self,
        symbol: &str,
        expiration: Option<&str>,
    ) -> Result<OptionsChain, FinanceServiceError> {
        options::fetch_chain(self.client.as_ref(), symbol, expiration).await
    }

    /// Close prices for a resolved chart window.
    pub async fn get_chart(
        &self,
        symbol: &str,
        window: ChartWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<ChartPoint>, FinanceServiceError> {
        chart::fetch_chart(self.client.as_ref(), symbol, window, now).await
    }

    /// Fetch earnings events for a date range from the calendar provider.
    pub async fn get_earnings_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
        let key = self
            .finnhub_api_key
            .as_deref()
            .ok_or(FinanceServiceError::MissingApiKey("FINNHUB_API_KEY"))?;
        earnings::fetch_earnings_range(&self.http, key, from, to).await
    }
}

/// Pull the overview fields out of a `quoteResponse` payload.
fn extract_quote_fields(data: &Value) -> Vec<QuoteFields> {
    let empty = Vec::new();
    let results = data
        .get("quoteResponse")
        .and_then(|q| q.get("result"))
        .and_then(|r| r.as_array())
        .unwrap_or(&empty);

    results
        .iter()
        .filter_map(|result| {
            Some(QuoteFields {
                symbol: result.get("symbol")?.as_str()?.to_string(),
                short_name: result
                    .get("shortName")
                    .or_else(|| result.get("longName"))
                    .and_then(|n| n.as_str())
                    .map(|s| s.to_string()),
                price: extract_f64_raw(result, &["regularMarketPrice"]),
                change: extract_f64_raw(result, &["regularMarketChange"]),
                percent_change: extract_f64_raw(result, &["regularMarketChangePercent"]),
            })
        })
        .collect()
}

fn details_from_summary(symbol: &str, result: &Value) -> StockDetails {
    let name = ["longName", "shortName"]
        .iter()
        .find_map(|key| {
            result
                .get("price")
                .and_then(|p| p.get(*key))
                .and_then(|n| n.as_str())
                .filter(|n| !n.trim().is_empty())
        })
        .map(|s| s.to_string())
        .unwrap_or_else(|| symbol.to_uppercase());

    StockDetails {
        name,
        price: extract_f64_raw(result, &["price", "regularMarketPrice"]),
        change: extract_f64_raw(result, &["price", "regularMarketChange"]),
        percent_change: extract_f64_raw(result, &["price", "regularMarketChangePercent"]),
        market_cap: extract_f64_raw(result, &["summaryDetail", "marketCap"])
            .or_else(|| extract_f64_raw(result, &["price", "marketCap"])),
        volume: extract_f64_raw(result, &["summaryDetail", "volume"])
            .or_else(|| extract_f64_raw(result, &["price", "regularMarketVolume"])),
        trailing_pe_ratio: extract_f64_raw(result, &["summaryDetail", "trailingPE"]),
        forward_pe_ratio: extract_f64_raw(result, &["summaryDetail", "forwardPE"]),
        dividend_yield: extract_f64_raw(result, &["summaryDetail", "dividendYield"]),
        high_52_week: extract_f64_raw(result, &["summaryDetail", "fiftyTwoWeekHigh"]),
        low_52_week: extract_f64_raw(result, &["summaryDetail", "fiftyTwoWeekLow"]),
        profile: result
            .get("assetProfile")
            .and_then(|a| a.get("longBusinessSummary"))
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
    }
}

/// Read a number that Yahoo may wrap as `{ "raw": .., "fmt": .. }`.
fn extract_f64_raw(root: &Value, path: &[&str]) -> Option<f64> {
    let mut current = root;
    for key in path {
        current = current.get(*key)?;
    }

    current
        .get("raw")
        .and_then(|v| v.as_f64())
        .or_else(|| current.as_f64())
}
