use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Symbolic chart range selected in the ticker view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    OneDay,
    FiveDays,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    FiveYears,
    TenYears,
}

impl ChartRange {
    /// Case-insensitive parse; unknown strings fall back to one day.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "1D" => Self::OneDay,
            "5D" => Self::FiveDays,
            "2W" => Self::TwoWeeks,
            "1M" => Self::OneMonth,
            "3M" => Self::ThreeMonths,
            "6M" => Self::SixMonths,
            "YTD" => Self::YearToDate,
            "1Y" => Self::OneYear,
            "5Y" => Self::FiveYears,
            "10Y" => Self::TenYears,
            _ => Self::OneDay,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::FiveDays => "5D",
            Self::TwoWeeks => "2W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::YearToDate => "YTD",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
            Self::TenYears => "10Y",
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling interval understood by the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl ChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneDay => "1d",
            Self::OneWeek => "1wk",
            Self::OneMonth => "1mo",
        }
    }
}

impl fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved query parameters for a chart fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartWindow {
    pub period1: NaiveDate,
    pub interval: ChartInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}
