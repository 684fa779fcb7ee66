use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// One side (call or put) of an options chain at a single strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_symbol: Option<String>,
    pub strike: f64,
    #[serde(default)]
    pub last_price: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub ask: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implied_volatility: Option<f64>,
    #[serde(default)]
    pub in_the_money: bool,
}

impl OptionContract {
    pub fn at_strike(strike: f64) -> Self {
        Self {
            contract_symbol: None,
            strike,
            last_price: 0.0,
            bid: 0.0,
            ask: 0.0,
            change: 0.0,
            percent_change: None,
            volume: None,
            open_interest: None,
            implied_volatility: None,
            in_the_money: false,
        }
    }
}

/// Full chain for one expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsChain {
    /// Expiration date, `YYYY-MM-DD`.
    pub date: String,
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
    pub current_price: Option<f64>,
}

/// Calls and puts merged on one strike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedStrikeRow {
    pub strike: f64,
    pub call: Option<OptionContract>,
    pub put: Option<OptionContract>,
}

/// Windowed chain as returned to the options card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsView {
    pub date: String,
    pub current_price: Option<f64>,
    pub rows: Vec<CombinedStrikeRow>,
}

/// How many strikes the options card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeCount {
    All,
    Count(usize),
}

impl Default for StrikeCount {
    fn default() -> Self {
        StrikeCount::Count(10)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid strike count {0:?}: expected \"all\" or a whole number")]
pub struct ParseStrikeCountError(String);

impl FromStr for StrikeCount {
    type Err = ParseStrikeCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(StrikeCount::All);
        }
        trimmed
            .parse::<usize>()
            .map(StrikeCount::Count)
            .map_err(|_| ParseStrikeCountError(s.to_string()))
    }
}

impl fmt::Display for StrikeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrikeCount::All => f.write_str("all"),
            StrikeCount::Count(n) => write!(f, "{n}"),
        }
    }
}

impl<'de> Deserialize<'de> for StrikeCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strike_counts() {
        assert_eq!("all".parse::<StrikeCount>().unwrap(), StrikeCount::All);
        assert_eq!("ALL".parse::<StrikeCount>().unwrap(), StrikeCount::All);
        assert_eq!("20".parse::<StrikeCount>().unwrap(), StrikeCount::Count(20));
        assert!("-4".parse::<StrikeCount>().is_err());
        assert!("ten".parse::<StrikeCount>().is_err());
    }

    #[test]
    fn contract_defaults_missing_prices() {
        let c: OptionContract =
            serde_json::from_str(r#"{"strike":100.0,"inTheMoney":true}"#).unwrap();
        assert_eq!(c.strike, 100.0);
        assert_eq!(c.bid, 0.0);
        assert!(c.in_the_money);
    }
}
