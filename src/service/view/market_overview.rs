use crate::models::IndexQuote;

/// Placeholder for values the provider left out.
pub const NOT_AVAILABLE: &str = "N/A";

/// Index symbols on the overview card with their display names.
pub const INDEX_TICKERS: [(&str, &str); 6] = [
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "Nasdaq"),
    ("^RUT", "Russell 2000"),
    ("^VIX", "VIX"),
    ("^TNX", "10-Yr Treasury"),
];

// Quoted as a yield, so the value renders as a percentage.
const YIELD_SYMBOL: &str = "^TNX";

/// Raw quote fields the overview needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFields {
    pub symbol: String,
    pub short_name: Option<String>,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
}

pub fn display_name(symbol: &str) -> Option<&'static str> {
    INDEX_TICKERS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| *name)
}

/// Shape one raw quote into an overview tile.
pub fn format_index_quote(quote: &QuoteFields) -> IndexQuote {
    let is_positive = quote.change.map(|c| c >= 0.0).unwrap_or(false);

    let value = match quote.price {
        Some(p) if quote.symbol == YIELD_SYMBOL => format!("{p:.2}%"),
        Some(p) => with_thousands(p),
        None => NOT_AVAILABLE.to_string(),
    };

    let change = quote
        .change
        .map(|c| format!("{c:.2}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let percent_change = match quote.percent_change {
        Some(p) if is_positive => format!("+{p:.2}%"),
        Some(p) => format!("{p:.2}%"),
        None => NOT_AVAILABLE.to_string(),
    };

    let name = display_name(&quote.symbol)
        .map(str::to_string)
        .or_else(|| quote.short_name.clone())
        .unwrap_or_else(|| quote.symbol.clone());

    IndexQuote {
        name,
        symbol: quote.symbol.clone(),
        value,
        change,
        percent_change,
        is_positive,
    }
}

/// Two decimals with comma thousands separators, e.g. `43,821.07`.
pub fn with_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
