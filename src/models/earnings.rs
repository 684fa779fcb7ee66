use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// When in the trading day a company reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EarningsTiming {
    /// Before market open.
    Bmo,
    /// During market hours.
    Dmh,
    /// After market close.
    Amc,
    #[default]
    Unknown,
}

impl EarningsTiming {
    /// Parse the provider's timing code. Anything unrecognised is `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "bmo" => Self::Bmo,
            "dmh" => Self::Dmh,
            "amc" => Self::Amc,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Bmo => "bmo",
            Self::Dmh => "dmh",
            Self::Amc => "amc",
            Self::Unknown => "",
        }
    }

    /// Sort priority inside a day: pre-market first, unknown last.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Bmo => 1,
            Self::Dmh => 2,
            Self::Amc => 3,
            Self::Unknown => 4,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Bmo => "Pre-Market",
            Self::Dmh => "During Hours",
            Self::Amc => "After Close",
            Self::Unknown => "Unknown Time",
        }
    }
}

impl fmt::Display for EarningsTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl Serialize for EarningsTiming {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> Deserialize<'de> for EarningsTiming {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_code).unwrap_or_default())
    }
}

/// Upcoming earnings announcement as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEvent {
    pub ticker: String,
    /// ISO calendar date, possibly carrying a time suffix.
    pub date: String,
    #[serde(rename = "hour", default)]
    pub timing: EarningsTiming,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps_estimate: Option<f64>,
}

impl EarningsEvent {
    pub fn new(ticker: impl Into<String>, date: impl Into<String>, timing: EarningsTiming) -> Self {
        Self {
            ticker: ticker.into(),
            date: date.into(),
            timing,
            eps_estimate: None,
        }
    }

    /// Calendar date from the leading `YYYY-MM-DD`, ignoring any time suffix.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let head = self.date.get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }
}

/// A display bucket of earnings sharing one day/timing label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsGroup {
    pub label: String,
    /// Earliest event date in the group; `None` when no date parsed.
    pub sort_date: Option<NaiveDate>,
    pub sort_priority: u8,
    pub timing: EarningsTiming,
    pub events: Vec<EarningsEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_codes_are_lenient() {
        assert_eq!(EarningsTiming::from_code("BMO"), EarningsTiming::Bmo);
        assert_eq!(EarningsTiming::from_code(" amc "), EarningsTiming::Amc);
        assert_eq!(EarningsTiming::from_code("dmh"), EarningsTiming::Dmh);
        assert_eq!(EarningsTiming::from_code(""), EarningsTiming::Unknown);
        assert_eq!(EarningsTiming::from_code("16:00"), EarningsTiming::Unknown);
    }

    #[test]
    fn deserializes_provider_shape() {
        let ev: EarningsEvent =
            serde_json::from_str(r#"{"ticker":"AAPL","date":"2025-01-30","hour":"amc"}"#)
                .unwrap();
        assert_eq!(ev.timing, EarningsTiming::Amc);

        let ev: EarningsEvent =
            serde_json::from_str(r#"{"ticker":"AAPL","date":"2025-01-30","hour":null}"#)
                .unwrap();
        assert_eq!(ev.timing, EarningsTiming::Unknown);

        let ev: EarningsEvent =
            serde_json::from_str(r#"{"ticker":"AAPL","date":"2025-01-30"}"#).unwrap();
        assert_eq!(ev.timing, EarningsTiming::Unknown);
    }

    #[test]
    fn calendar_date_ignores_time_suffix() {
        let ev = EarningsEvent::new("MSFT", "2025-01-29T21:00:00Z", EarningsTiming::Amc);
        assert_eq!(ev.calendar_date(), NaiveDate::from_ymd_opt(2025, 1, 29));

        let bad = EarningsEvent::new("MSFT", "soon", EarningsTiming::Amc);
        assert_eq!(bad.calendar_date(), None);
    }
}
