use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use finance_query_core::YahooFinanceClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{ChartPoint, ChartWindow};
use crate::service::finance::FinanceServiceError;

/// Fetch close prices from `window.period1` up to `now`.
///
/// A window with no bars yet (pre-market, a holiday) is an empty series.
pub async fn fetch_chart(
    client: &YahooFinanceClient,
    symbol: &str,
    window: ChartWindow,
    now: DateTime<Utc>,
) -> Result<Vec<ChartPoint>, FinanceServiceError> {
    let symbol = symbol.to_uppercase();
    info!(
        "Fetching chart for {} from {} at {}",
        symbol, window.period1, window.interval
    );

    let data = client
        .get_chart_with_periods(
            &symbol,
            window.interval.as_str(),
            market_midnight(window.period1),
            now.timestamp(),
        )
        .await
        .map_err(|e| {
            warn!("Chart request failed for {}: {}", symbol, e);
            FinanceServiceError::from_yahoo(format!("chart data for {symbol}"), e)
        })?;

    let points = points_from_response(&data);
    info!("Chart for {} has {} points", symbol, points.len());
    Ok(points)
}

// Start of the trading day in New York, as a unix timestamp.
fn market_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| New_York.from_local_datetime(&dt).earliest())
        .map(|dt| dt.timestamp())
        .unwrap_or_default()
}

fn points_from_response(data: &Value) -> Vec<ChartPoint> {
    let chart = data.get("chart");
    if let Some(err) = chart.and_then(|c| c.get("error")).filter(|e| !e.is_null()) {
        warn!("Chart API error: {}", err);
        return Vec::new();
    }

    let Some(result) = chart
        .and_then(|c| c.get("result"))
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
    else {
        return Vec::new();
    };

    let empty = Vec::new();
    let timestamps = result
        .get("timestamp")
        .and_then(|t| t.as_array())
        .unwrap_or(&empty);
    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .unwrap_or(&empty);

    timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let price = close.as_f64().filter(|p| p.is_finite())?;
            let time = DateTime::<Utc>::from_timestamp(ts.as_i64()?, 0)?;
            Some(ChartPoint { time, price })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_null_closes() {
        let data = json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL" },
                    "timestamp": [1738159800, 1738159860, 1738159920],
                    "indicators": { "quote": [{ "close": [236.1, null, 236.4] }] }
                }],
                "error": null
            }
        });
        let points = points_from_response(&data);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 236.1);
        assert_eq!(points[1].time.timestamp(), 1738159920);
    }

    #[test]
    fn window_without_bars_is_empty_series() {
        // What Yahoo sends for a day that has not opened yet.
        let data = json!({
            "chart": {
                "result": [{ "meta": { "symbol": "AAPL" }, "indicators": { "quote": [{}] } }],
                "error": null
            }
        });
        assert!(points_from_response(&data).is_empty());
    }

    #[test]
    fn provider_error_yields_no_points() {
        let data = json!({"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}});
        assert!(points_from_response(&data).is_empty());
    }

    #[test]
    fn period_starts_at_new_york_midnight() {
        // 2025-01-29 00:00 EST = 05:00 UTC; 2025-07-16 00:00 EDT = 04:00 UTC.
        let winter = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        assert_eq!(market_midnight(winter), 1738126800);
        let summer = NaiveDate::from_ymd_opt(2025, 7, 16).unwrap();
        assert_eq!(market_midnight(summer), 1752638400);
    }

    #[test]
    fn serializes_time_as_rfc3339() {
        let point = ChartPoint {
            time: DateTime::<Utc>::from_timestamp(1738159800, 0).unwrap(),
            price: 1.5,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["time"], "2025-01-29T14:10:00Z");
    }
}
