use serde::{Deserialize, Serialize};

/// Index tile on the market overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    pub name: String,
    pub symbol: String,
    /// Display value; yields render as a percentage.
    pub value: String,
    pub change: String,
    pub percent_change: String,
    pub is_positive: bool,
}

/// Per-ticker header data for the single stock view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    pub name: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    #[serde(rename = "trailingPERatio")]
    pub trailing_pe_ratio: Option<f64>,
    #[serde(rename = "forwardPERatio")]
    pub forward_pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    #[serde(rename = "high52Week")]
    pub high_52_week: Option<f64>,
    #[serde(rename = "low52Week")]
    pub low_52_week: Option<f64>,
    pub profile: Option<String>,
}
