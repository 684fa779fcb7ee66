use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{EarningsEvent, EarningsTiming};
use crate::service::finance::FinanceServiceError;

const EARNINGS_API_URL: &str = "https://finnhub.io/api/v1/calendar/earnings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    earnings_calendar: Option<Vec<ApiEarning>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEarning {
    symbol: Option<String>,
    date: Option<String>,
    hour: Option<String>,
    eps_estimate: Option<f64>,
}

/// Fetch earnings for an inclusive date range from the Finnhub calendar.
pub async fn fetch_earnings_range(
    client: &Client,
    api_key: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
    info!("Fetching earnings from {} to {}", from, to);

    let from_str = from.format("%Y-%m-%d").to_string();
    let to_str = to.format("%Y-%m-%d").to_string();

    let resp = client
        .get(EARNINGS_API_URL)
        .query(&[
            ("from", from_str.as_str()),
            ("to", to_str.as_str()),
            ("token", api_key),
        ])
        .send()
        .await
        .map_err(|e| {
            warn!("Earnings API request failed: {}", e.without_url());
            FinanceServiceError::Http("earnings request failed".into())
        })?;

    info!("Received response with status: {}", resp.status());

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read body".to_string());
        warn!("Earnings API returned error status {}: {}", status, body);
        return Err(FinanceServiceError::Http(format!(
            "earnings api status {status}"
        )));
    }

    let raw_bytes = resp.bytes().await.map_err(|e| {
        warn!("Failed to read earnings API body: {}", e.without_url());
        FinanceServiceError::Http("earnings body read failed".into())
    })?;

    let parsed: ApiResponse = serde_json::from_slice(&raw_bytes).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw_bytes[..raw_bytes.len().min(500)]);
        warn!(
            "Failed to parse earnings API response: {}; body preview: {}",
            e, preview
        );
        FinanceServiceError::Http(format!("earnings parse failed: {e}"))
    })?;

    let events = events_from_response(parsed);
    info!("Successfully parsed earnings payload; built {} events", events.len());

    Ok(events)
}

fn events_from_response(parsed: ApiResponse) -> Vec<EarningsEvent> {
    let mut events: Vec<EarningsEvent> = parsed
        .earnings_calendar
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| {
            let ticker = e.symbol.filter(|s| !s.trim().is_empty())?;
            let date = e.date.filter(|d| !d.trim().is_empty())?;
            Some(EarningsEvent {
                ticker,
                date,
                timing: e
                    .hour
                    .as_deref()
                    .map(EarningsTiming::from_code)
                    .unwrap_or_default(),
                eps_estimate: e.eps_estimate,
            })
        })
        .collect();

    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_rows_without_symbol_or_date() {
        let body = r#"{
            "earningsCalendar": [
                { "symbol": "MSFT", "date": "2025-01-29", "hour": "amc", "epsEstimate": 3.11 },
                { "symbol": "", "date": "2025-01-29", "hour": "bmo" },
                { "symbol": "TSLA", "date": null, "hour": "amc" },
                { "symbol": "AAPL", "date": "2025-01-30", "hour": "" },
                { "symbol": "IBM", "date": "2025-01-29", "hour": "dmh" }
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        let events = events_from_response(parsed);

        let tickers: Vec<&str> = events.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["IBM", "MSFT", "AAPL"]);
        assert_eq!(events[1].eps_estimate, Some(3.11));
        assert_eq!(events[2].timing, EarningsTiming::Unknown);
    }

    #[test]
    fn missing_calendar_is_empty_not_error() {
        let parsed: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(events_from_response(parsed).is_empty());
    }
}
