pub mod foodi;
pub mod health;
pub mod market;
pub mod options;
pub mod stock;

use chrono::{NaiveDate, Utc};
use chrono_tz::America::New_York;

use crate::service::api::ApiError;

const MAX_TICKER_LEN: usize = 15;

/// Uppercase a path ticker and reject anything Yahoo would not list.
pub(crate) fn normalize_ticker(raw: &str) -> Result<String, ApiError> {
    let ticker = raw.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(ticker)
    } else {
        Err(ApiError::BadRequest(format!("Invalid ticker: {raw}")))
    }
}

/// Calendar date on Wall Street right now.
pub(crate) fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&New_York).date_naive()
}
