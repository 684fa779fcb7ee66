use chrono::NaiveDate;
use finance_query_core::{OptionChain, OptionContract as YahooContract, YahooFinanceClient};
use tracing::{info, warn};

use crate::models::{OptionContract, OptionsChain};
use crate::service::finance::FinanceServiceError;

/// List expiration dates for a ticker as `YYYY-MM-DD`, nearest first.
pub async fn fetch_expirations(
    client: &YahooFinanceClient,
    symbol: &str,
) -> Result<Vec<String>, FinanceServiceError> {
    let symbol = symbol.to_uppercase();
    let listed = client
        .get_option_expirations(&symbol)
        .await
        .map_err(|e| {
            warn!("Options expirations request failed for {}: {}", symbol, e);
            FinanceServiceError::from_yahoo(format!("options for {symbol}"), e)
        })?;

    let dates = sorted_expirations(listed.expirations);
    if dates.is_empty() {
        return Err(FinanceServiceError::NotFound(format!("options for {symbol}")));
    }
    Ok(dates)
}

/// Fetch the chain for `expiration`, or the nearest expiration when `None`.
pub async fn fetch_chain(
    client: &YahooFinanceClient,
    symbol: &str,
    expiration: Option<&str>,
) -> Result<OptionsChain, FinanceServiceError> {
    let requested = expiration.map(parse_expiration).transpose()?;
    let listed = fetch_expirations(client, symbol).await?;
    let date = select_expiration(symbol, &listed, requested)?;

    let symbol = symbol.to_uppercase();
    info!("Fetching options chain for {} expiring {}", symbol, date);
    let chain = client
        .get_option_chain(&symbol, Some(&date))
        .await
        .map_err(|e| {
            warn!("Options chain request failed for {} {}: {}", symbol, date, e);
            FinanceServiceError::from_yahoo(format!("expiration {date} for {symbol}"), e)
        })?;

    Ok(chain_from_yahoo(date, chain))
}

fn parse_expiration(raw: &str) -> Result<NaiveDate, FinanceServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        FinanceServiceError::InvalidInput(format!("expiration {raw:?} is not YYYY-MM-DD"))
    })
}

fn select_expiration(
    symbol: &str,
    listed: &[String],
    requested: Option<NaiveDate>,
) -> Result<String, FinanceServiceError> {
    match requested {
        Some(date) => {
            let wanted = date.format("%Y-%m-%d").to_string();
            if listed.contains(&wanted) {
                Ok(wanted)
            } else {
                Err(FinanceServiceError::NotFound(format!(
                    "expiration {wanted} for {}",
                    symbol.to_uppercase()
                )))
            }
        }
        None => listed
            .first()
            .cloned()
            .ok_or_else(|| FinanceServiceError::NotFound(format!("options for {}", symbol.to_uppercase()))),
    }
}

fn sorted_expirations(raw: Vec<String>) -> Vec<String> {
    let mut dates: Vec<NaiveDate> = raw
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect();
    dates.sort();
    dates.dedup();
    dates
        .into_iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

fn chain_from_yahoo(date: String, chain: OptionChain) -> OptionsChain {
    OptionsChain {
        date,
        calls: convert_side(chain.calls),
        puts: convert_side(chain.puts),
        current_price: chain.underlying_price.filter(|p| p.is_finite()),
    }
}

fn convert_side(raw: Vec<YahooContract>) -> Vec<OptionContract> {
    raw.into_iter()
        .filter(|c| c.strike.is_finite())
        .map(|c| OptionContract {
            contract_symbol: Some(c.contract_symbol).filter(|s| !s.trim().is_empty()),
            strike: c.strike,
            last_price: finite_or_zero(c.last_price),
            bid: finite_or_zero(c.bid),
            ask: finite_or_zero(c.ask),
            change: finite_or_zero(c.change),
            percent_change: Some(c.percent_change).filter(|v| v.is_finite()),
            volume: c.volume.and_then(|v| i64::try_from(v).ok()),
            open_interest: c.open_interest.and_then(|v| i64::try_from(v).ok()),
            implied_volatility: Some(c.implied_volatility).filter(|v| v.is_finite()),
            in_the_money: c.in_the_money,
        })
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use finance_query_core::YahooError;

    fn contract(strike: f64, last: f64) -> YahooContract {
        YahooContract {
            contract_symbol: format!("AAPL250214C{:08}", (strike * 1000.0) as u64),
            last_trade_date: DateTime::<Utc>::from_timestamp(1739491200, 0).unwrap(),
            strike,
            last_price: last,
            bid: last - 0.1,
            ask: last + 0.1,
            change: 0.3,
            percent_change: 7.9,
            volume: Some(1200),
            open_interest: None,
            implied_volatility: 0.27,
            in_the_money: strike < 232.1,
            contract_size: "REGULAR".into(),
            currency: "USD".into(),
        }
    }

    fn listed() -> Vec<String> {
        sorted_expirations(vec!["2025-02-21".into(), "2025-02-14".into(), "2025-02-14".into()])
    }

    #[test]
    fn expirations_are_sorted_and_deduped() {
        assert_eq!(listed(), vec!["2025-02-14", "2025-02-21"]);
        assert!(sorted_expirations(vec!["not-a-date".into()]).is_empty());
    }

    #[test]
    fn defaults_to_nearest_expiration() {
        assert_eq!(select_expiration("aapl", &listed(), None).unwrap(), "2025-02-14");

        let feb21 = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        assert_eq!(select_expiration("aapl", &listed(), Some(feb21)).unwrap(), "2025-02-21");
    }

    #[test]
    fn unknown_expiration_is_not_found() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let err = select_expiration("AAPL", &listed(), Some(date)).unwrap_err();
        assert!(matches!(err, FinanceServiceError::NotFound(_)));
        assert!(matches!(select_expiration("AAPL", &[], None), Err(FinanceServiceError::NotFound(_))));
    }

    #[test]
    fn malformed_expiration_is_invalid_input() {
        assert!(matches!(parse_expiration("02/14/2025"), Err(FinanceServiceError::InvalidInput(_))));
        assert_eq!(parse_expiration(" 2025-02-14 ").unwrap(), NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
    }

    #[test]
    fn converts_provider_chain() {
        let mut odd = contract(240.0, f64::NAN);
        odd.contract_symbol = String::new();
        odd.volume = Some(u64::MAX);
        let chain = OptionChain {
            symbol: "AAPL".into(),
            expiration_date: "2025-02-14".into(),
            calls: vec![contract(230.0, 4.1), contract(f64::NAN, 1.0), odd],
            puts: vec![contract(230.0, 1.9)],
            underlying_price: Some(232.1),
        };

        let converted = chain_from_yahoo("2025-02-14".into(), chain);
        assert_eq!(converted.date, "2025-02-14");
        assert_eq!(converted.current_price, Some(232.1));
        // Contracts without a usable strike are dropped.
        assert_eq!(converted.calls.len(), 2);
        assert_eq!(converted.puts.len(), 1);

        let first = &converted.calls[0];
        assert!(first.in_the_money);
        assert_eq!(first.volume, Some(1200));
        assert_eq!(first.implied_volatility, Some(0.27));

        let odd = &converted.calls[1];
        assert_eq!(odd.last_price, 0.0);
        assert_eq!(odd.contract_symbol, None);
        assert_eq!(odd.volume, None);
    }

    #[test]
    fn provider_not_found_maps_to_not_found() {
        let err = FinanceServiceError::from_yahoo("options for ZZZZ", YahooError::NotFound("x".into()));
        assert!(matches!(err, FinanceServiceError::NotFound(ref w) if w == "options for ZZZZ"));

        let empty = YahooError::ParseError("No option chain data".into());
        assert!(matches!(
            FinanceServiceError::from_yahoo("options for ZZZZ", empty),
            FinanceServiceError::NotFound(_)
        ));

        let auth = FinanceServiceError::from_yahoo("options for AAPL", YahooError::AuthFailed("401".into()));
        assert!(matches!(auth, FinanceServiceError::Yahoo(_)));
    }
}
